use crate::representation::Assignment;
use serde::{Deserialize, Serialize};

pub mod command_line;
pub mod session;
pub mod web;

/// 一次搜索的最终结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub solution: Assignment,
    pub fitness: f64,
    pub manager_weighting: u8,
    pub evaluation: Vec<String>,
}

/// 向用户反馈的消息类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Message {
    /// 整数百分比
    Progress(u8),
    Result(RunResult),
    Evaluate(Vec<String>),
    /// 第一代用时，单位为微秒
    Elapsed(u64),
}

/// 定义了向用户报告消息的接口，用于统一命令行、服务器和图形界面的输出方式
///
/// 各种界面只需要各自实现 send 方法，就可向用户报告进度和结果
pub trait Interface {
    fn send(&self, message: Message);
}
