//! libgenmatch 是使用 Rust 实现的毕业生与岗位双向匹配算法。它同时发布为一个 Rust crate 和一个 wasm 模块，前者可以在 Rust 项目中安装为依赖来使用，后者可以在浏览器的 Web Worker 中运行。
//!
//! genmatch 是使用 libgenmatch 实现的命令行程序，用户提供毕业生志愿表和岗位表，本程序基于遗传算法搜索让双方都尽量满意的分配方案，也能评测已有的方案，或者作为 HTTP 服务器运行。

pub mod config;
pub mod data;
pub mod error;
pub mod interfaces;
pub mod objectives;
pub mod operators;
pub mod optimizers;
pub mod representation;
pub mod server;

pub use error::Error;
