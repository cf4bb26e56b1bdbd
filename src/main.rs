//! Xiangqi Engine CLI
//!
//! 命令行界面，用于测试 AI
//!
//! 支持三种模式：
//! 1. 单次命令模式：每次执行一个命令
//! 2. 对弈模式：在终端里和 AI 下一盘
//! 3. Server 模式：长驻进程，通过 stdin/stdout 通信

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;
use xiangqi_engine::session::{self, GameMode};
use xiangqi_engine::{
    apply_move_to_fen, get_node_count, reset_node_count, AIConfig, AIStrategy, Board, Color,
    EngineConfig, EngineResult, GameStatus, MinimaxAI, Move, ScoredMove,
};

#[derive(Parser)]
#[command(name = "xiangqi-engine")]
#[command(about = "Xiangqi rules engine and alpha-beta AI", long_about = None)]
struct Cli {
    /// JSON 配置文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 获取合法走法
    Moves {
        /// FEN 字符串
        #[arg(long)]
        fen: String,
    },

    /// 选择最佳走法
    Best {
        /// FEN 字符串
        #[arg(long)]
        fen: String,

        /// 搜索深度（默认取配置文件）
        #[arg(long)]
        depth: Option<u32>,

        /// 返回的走法数量
        #[arg(long, default_value = "1")]
        n: usize,

        /// JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 评估局面分数
    Score {
        /// FEN 字符串
        #[arg(long)]
        fen: String,

        /// JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 在终端里和 AI 对弈
    Play {
        /// 搜索深度（默认取配置文件）
        #[arg(long)]
        depth: Option<u32>,

        /// AI 执哪一方 (red, black)
        #[arg(long)]
        ai_color: Option<String>,
    },

    /// 启动 server 模式（stdin/stdout 通信）
    Server,
}

#[derive(Serialize, Deserialize)]
struct MoveResult {
    #[serde(rename = "move")]
    mv: String,
    score: i32,
}

impl From<ScoredMove> for MoveResult {
    fn from(sm: ScoredMove) -> Self {
        MoveResult {
            mv: sm.mv.to_iccs(),
            score: sm.score,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct MovesResponse {
    moves: Vec<MoveResult>,
    total: usize,
}

// Server 模式的请求和响应结构
#[derive(Serialize, Deserialize)]
struct ServerRequest {
    cmd: String,
    #[serde(default)]
    fen: String,
    #[serde(default, rename = "move")]
    mv: Option<String>,
    #[serde(default)]
    n: Option<usize>,
    #[serde(default)]
    depth: Option<u32>,
}

#[derive(Serialize, Deserialize, Default)]
struct ServerResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    moves: Option<Vec<MoveResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    legal_moves: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nodes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    // eval 命令的字段
    #[serde(skip_serializing_if = "Option::is_none")]
    eval: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<Color>,
    // move 命令的字段
    #[serde(skip_serializing_if = "Option::is_none")]
    fen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<GameStatus>,
}

impl ServerResponse {
    fn success_moves(moves: Vec<MoveResult>, depth: u32, nodes: u64, nps: f64, elapsed_ms: f64) -> Self {
        Self {
            ok: true,
            moves: Some(moves),
            depth: Some(depth),
            nodes: Some(nodes),
            nps: Some(nps),
            elapsed_ms: Some(elapsed_ms),
            ..Default::default()
        }
    }

    fn success_legal_moves(legal_moves: Vec<String>) -> Self {
        Self {
            ok: true,
            legal_moves: Some(legal_moves),
            ..Default::default()
        }
    }

    fn success_eval(eval_score: i32, color: Color) -> Self {
        Self {
            ok: true,
            eval: Some(eval_score),
            color: Some(color),
            ..Default::default()
        }
    }

    fn success_move(fen: String, status: GameStatus) -> Self {
        Self {
            ok: true,
            fen: Some(fen),
            status: Some(status),
            ..Default::default()
        }
    }

    fn error(msg: &str) -> Self {
        Self {
            ok: false,
            error: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

fn calc_nps(nodes: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs > 0.0 { nodes as f64 / elapsed_secs } else { 0.0 }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match text {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn exit_on_error<T>(result: EngineResult<T>) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    })
}

fn legal_moves_iccs(board: &Board) -> Vec<String> {
    board
        .legal_moves(board.current_player())
        .iter()
        .map(Move::to_iccs)
        .collect()
}

fn search_config(config: &EngineConfig, depth: Option<u32>) -> AIConfig {
    AIConfig {
        depth: depth.unwrap_or(config.search.depth),
        ..config.search.clone()
    }
}

/// 搜索并返回 (走法, 节点数, 耗时秒)
fn timed_search(board: &Board, ai: &MinimaxAI, n: usize) -> (Vec<ScoredMove>, u64, f64) {
    reset_node_count();
    let start = Instant::now();
    let moves = if n <= 1 {
        ai.find_best_move(board).into_iter().collect()
    } else {
        ai.select_moves(board, n)
    };
    (moves, get_node_count(), start.elapsed().as_secs_f64())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => exit_on_error(EngineConfig::from_json_file(path)),
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Moves { fen } => {
            let board = exit_on_error(Board::from_fen(&fen));
            let moves = legal_moves_iccs(&board);
            println!("Legal moves ({}):", moves.len());
            for mv in &moves {
                println!("  {}", mv);
            }
        }

        Commands::Best { fen, depth, n, json } => {
            let board = exit_on_error(Board::from_fen(&fen));
            let ai = MinimaxAI::new(&search_config(&config, depth));

            let (moves, nodes, elapsed) = timed_search(&board, &ai, n);
            let nps = calc_nps(nodes, elapsed);

            if json {
                let response = MovesResponse {
                    total: moves.len(),
                    moves: moves.into_iter().map(MoveResult::from).collect(),
                };
                print_json(&response, true);
                eprintln!(
                    "Stats: depth={}, nodes={}, time={:.3}s, nps={:.0}",
                    ai.depth(), nodes, elapsed, nps
                );
            } else {
                println!("Best moves (depth={}):", ai.depth());
                for sm in &moves {
                    println!("  {} (score: {})", sm.mv, sm.score);
                }
                println!(
                    "\nStats: depth={}, nodes={}, time={:.3}s, nps={:.0}",
                    ai.depth(), nodes, elapsed, nps
                );
            }
        }

        Commands::Score { fen, json } => {
            let board = exit_on_error(Board::from_fen(&fen));
            let color = board.current_player();
            let ai = MinimaxAI::new(&config.search);
            let score = ai.evaluate_position(&board, color);

            if json {
                print_json(
                    &serde_json::json!({ "fen": fen, "color": color, "score": score }),
                    false,
                );
            } else {
                let color_cn = if color == Color::Red { "红方" } else { "黑方" };
                println!("局面评估 ({} 视角): {}", color_cn, score);
            }
        }

        Commands::Play { depth, ai_color } => {
            let mut config = config;
            config.search = search_config(&config, depth);
            if let Some(name) = ai_color {
                config.session.ai_color = match name.chars().next().and_then(Color::from_fen_char) {
                    Some(color) => color,
                    None => {
                        eprintln!("Error: unknown color '{}'", name);
                        std::process::exit(1);
                    }
                };
            }
            exit_on_error(run_play(&config));
        }

        Commands::Server => {
            run_server(&config);
        }
    }
}

/// 对弈模式主循环
///
/// 输入 ICCS 走法（如 h2e2），或 undo / hint / restart / quit。
fn run_play(config: &EngineConfig) -> EngineResult<()> {
    let handle = session::spawn(config);
    handle.set_mode(GameMode::AiVsPlayer)?;

    if config.session.ai_color == Color::Red {
        handle.ai_move()?;
    }
    println!("{}", handle.snapshot()?);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let input = line.trim();

        match input {
            "" => continue,
            "quit" | "exit" => break,
            "undo" => {
                if !handle.undo()? {
                    println!("Nothing to undo");
                }
            }
            "restart" => {
                handle.restart()?;
                if config.session.ai_color == Color::Red {
                    handle.ai_move()?;
                }
            }
            "hint" => match handle.suggest()? {
                Some(mv) => println!("Suggested: {}", mv),
                None => println!("No legal moves"),
            },
            text => match Move::parse_iccs(text) {
                Ok((from, to)) => {
                    let outcome = handle.human_move(from, to)?;
                    if !outcome.accepted {
                        println!("Illegal move: {}", text);
                        continue;
                    }
                    if let Some(reply) = outcome.ai_reply {
                        println!("AI plays {}", reply);
                    }
                }
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            },
        }

        let board = handle.snapshot()?;
        println!("{}", board);
        if board.status().is_terminal() {
            println!("Game over: {:?}", board.status());
        }
    }

    handle.shutdown();
    Ok(())
}

/// Server 模式主循环
/// 从 stdin 读取 JSON 请求，返回 JSON 响应到 stdout
fn run_server(config: &EngineConfig) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        // 空行跳过
        if line.trim().is_empty() {
            continue;
        }

        // 解析请求
        let request: ServerRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                let response = ServerResponse::error(&format!("Invalid JSON: {}", e));
                print_json(&response, false);
                let _ = stdout.flush();
                continue;
            }
        };

        // 处理命令
        let response = match request.cmd.as_str() {
            "best" => handle_best_request(&request, config),
            "moves" => handle_moves_request(&request),
            "eval" => handle_eval_request(&request, config),
            "move" => handle_move_request(&request),
            "quit" => break,
            _ => ServerResponse::error(&format!("Unknown command: {}", request.cmd)),
        };

        // 返回响应
        print_json(&response, false);
        let _ = stdout.flush();
    }
}

/// 处理 best 命令
fn handle_best_request(request: &ServerRequest, config: &EngineConfig) -> ServerResponse {
    let board = match Board::from_fen(&request.fen) {
        Ok(board) => board,
        Err(e) => return ServerResponse::error(&e.to_string()),
    };
    let ai = MinimaxAI::new(&search_config(config, request.depth));
    let n = request.n.unwrap_or(5);

    let (moves, nodes, elapsed) = timed_search(&board, &ai, n);
    let move_results: Vec<MoveResult> = moves.into_iter().map(MoveResult::from).collect();

    ServerResponse::success_moves(
        move_results,
        ai.depth(),
        nodes,
        calc_nps(nodes, elapsed),
        elapsed * 1000.0,
    )
}

/// 处理 moves 命令
fn handle_moves_request(request: &ServerRequest) -> ServerResponse {
    match Board::from_fen(&request.fen) {
        Ok(board) => ServerResponse::success_legal_moves(legal_moves_iccs(&board)),
        Err(e) => ServerResponse::error(&e.to_string()),
    }
}

/// 处理 eval 命令（静态评估）
fn handle_eval_request(request: &ServerRequest, config: &EngineConfig) -> ServerResponse {
    match Board::from_fen(&request.fen) {
        Ok(board) => {
            let color = board.current_player();
            let score = MinimaxAI::new(&config.search).evaluate_position(&board, color);
            ServerResponse::success_eval(score, color)
        }
        Err(e) => ServerResponse::error(&e.to_string()),
    }
}

/// 处理 move 命令（走一步，返回新 FEN）
fn handle_move_request(request: &ServerRequest) -> ServerResponse {
    let Some(mv) = request.mv.as_deref() else {
        return ServerResponse::error("Missing field: move");
    };
    let fen = match apply_move_to_fen(&request.fen, mv) {
        Ok(fen) => fen,
        Err(e) => return ServerResponse::error(&e.to_string()),
    };
    match Board::from_fen(&fen) {
        Ok(board) => ServerResponse::success_move(fen, board.status()),
        Err(e) => ServerResponse::error(&e.to_string()),
    }
}
