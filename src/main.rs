//! genmatch: 毕业生岗位匹配［命令行版］
//!
//! `genmatch` 是一个使用 Rust 编写的命令行程序。用户提供毕业生志愿表、岗位表以及配置文件，本程序能够搜索分配方案、评测已有方案，或者启动 HTTP 服务器。
//!
//! 具体用法详见 README.md。

use clap::Parser;
use genmatch::interfaces::command_line::{Command, CommandLine, CommandLineArgs};
use genmatch::interfaces::session::{EvaluateRequest, Session};
use genmatch::interfaces::{Interface, Message};
use genmatch::server::start_server;
use genmatch::Error;
use tracing::Level;

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();
    let args = CommandLineArgs::parse();
    let command_line = CommandLine::new(args.clone(), None);
    match args.command {
        Command::Optimize => {
            let config = command_line.read_config()?;
            let mut session = Session::new();
            session.init(command_line.read_preferences()?)?;
            session.run_with(command_line.run_request(&config), &command_line)?;
        }
        Command::Evaluate { solution } => {
            let mut session = Session::new();
            session.init(command_line.read_preferences()?)?;
            let solution = command_line.read_solution(&solution)?;
            let lines = session.evaluate(EvaluateRequest { solution })?;
            command_line.send(Message::Evaluate(lines));
        }
        Command::Server { port } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(start_server(port))?;
        }
    }
    Ok(())
}
