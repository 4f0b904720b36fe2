use super::session::{InitRequest, RunRequest};
use super::{Interface, Message, RunResult};
use crate::config::Config;
use crate::data::{GraduatePreference, Placement};
use crate::representation::Assignment;
use crate::Error;
use chrono::Local;
use clap::{Parser, Subcommand};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use regex::Regex;
use std::fs::{create_dir_all, read_to_string, write, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::error;

/// 命令行参数的定义
#[derive(Parser, Clone, Debug)]
#[command(name = "genmatch")]
#[command(author, version, about, long_about)]
#[command(propagate_version = true)]
pub struct CommandLineArgs {
    #[command(subcommand)]
    pub command: Command,
    /// 配置文件，默认为 config.yaml，不存在时使用默认配置
    pub config: Option<PathBuf>,
    /// 毕业生志愿表，默认为 graduates.csv
    #[arg(short, long, value_name = "FILE")]
    pub graduates: Option<PathBuf>,
    /// 岗位名额与偏好表，默认为 placements.csv
    #[arg(short, long, value_name = "FILE")]
    pub placements: Option<PathBuf>,
    /// 随机数种子，覆盖配置文件中的设置
    #[arg(long)]
    pub seed: Option<u64>,
}

/// 命令行中所有可用的子命令
#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// 搜索最优的分配方案
    Optimize,
    /// 评测一个已有的分配方案
    Evaluate {
        /// 两列的方案表：毕业生，岗位
        #[arg(short, long, value_name = "FILE")]
        solution: PathBuf,
    },
    /// 启动 HTTP 服务器
    Server {
        #[arg(long, default_value_t = 3200)]
        port: u16,
    },
}

/// 去掉非数字字符之后解析编号，空单元格返回 `None`
fn parse_id(cell: &str, non_digits: &Regex) -> Result<Option<u32>, Error> {
    let digits = non_digits.replace_all(cell, "");
    if digits.is_empty() {
        return Ok(None);
    }
    digits
        .parse()
        .map(Some)
        .map_err(|e| Error::from(format!("cannot read \"{cell}\" as an id: {e}")))
}

/// 读取表格的每一行，第一行是表头，行的长度可以不同
fn rows<R: Read>(reader: R) -> Result<Vec<StringRecord>, Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = vec![];
    for record in reader.records() {
        rows.push(record?);
    }
    Ok(rows)
}

fn non_digits() -> Result<Regex, Error> {
    Regex::new(r"\D").map_err(|e| Error::from(e.to_string()))
}

/// 解析一行中从第 skip 列开始的所有编号
fn ranking(record: &StringRecord, skip: usize, non_digits: &Regex) -> Result<Vec<u32>, Error> {
    let mut ids = vec![];
    for cell in record.iter().skip(skip) {
        if let Some(id) = parse_id(cell, non_digits)? {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// 毕业生表：第一列是编号，其余各列是按顺序排列的岗位志愿
pub fn read_graduates<R: Read>(reader: R) -> Result<Vec<GraduatePreference>, Error> {
    let non_digits = non_digits()?;
    let mut graduates = vec![];
    for record in rows(reader)? {
        let Some(id) = parse_id(record.get(0).unwrap_or_default(), &non_digits)? else {
            continue;
        };
        graduates.push(GraduatePreference {
            id,
            placement_rankings: ranking(&record, 1, &non_digits)?,
        });
    }
    Ok(graduates)
}

/// 岗位表：第一列是编号，第二列是名额，其余各列是岗位经理对毕业生的排序
pub fn read_placements<R: Read>(reader: R) -> Result<Vec<Placement>, Error> {
    let non_digits = non_digits()?;
    let mut placements = vec![];
    for record in rows(reader)? {
        let Some(id) = parse_id(record.get(0).unwrap_or_default(), &non_digits)? else {
            continue;
        };
        let Some(quota) = parse_id(record.get(1).unwrap_or_default(), &non_digits)? else {
            return Err(format!("placement {id} has no quota").into());
        };
        placements.push(Placement {
            id,
            quota: quota as usize,
            graduate_rankings: ranking(&record, 2, &non_digits)?,
        });
    }
    Ok(placements)
}

/// 方案表：毕业生，岗位
pub fn read_solution<R: Read>(reader: R) -> Result<Assignment, Error> {
    let non_digits = non_digits()?;
    let mut solution = Assignment::new();
    for record in rows(reader)? {
        let graduate = parse_id(record.get(0).unwrap_or_default(), &non_digits)?;
        let placement = parse_id(record.get(1).unwrap_or_default(), &non_digits)?;
        if let (Some(graduate), Some(placement)) = (graduate, placement) {
            solution.insert(graduate, placement);
        }
    }
    Ok(solution)
}

fn open(path: &Path) -> Result<File, Error> {
    File::open(path).map_err(|e| Error::from(format!("cannot open {}: {e}", path.display())))
}

/// 通过命令行来使用 genmatch 的入口，实现了界面特征
pub struct CommandLine {
    pub args: CommandLineArgs,
    pub output_dir: PathBuf,
}

impl CommandLine {
    pub fn new(args: CommandLineArgs, output_dir: Option<PathBuf>) -> Self {
        let output_dir = output_dir.unwrap_or_else(|| {
            let time = Local::now().format("%m-%d+%H_%M_%S").to_string();
            PathBuf::from(format!("output-{time}"))
        });
        Self { args, output_dir }
    }

    pub fn read_config(&self) -> Result<Config, Error> {
        let path = match &self.args.config {
            Some(path) => path.clone(),
            None => {
                let path = PathBuf::from("config.yaml");
                if !path.exists() {
                    return Ok(Config::default());
                }
                path
            }
        };
        let content = read_to_string(&path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        Config::from_yaml(&content)
    }

    pub fn read_preferences(&self) -> Result<InitRequest, Error> {
        let graduates_path = self
            .args
            .graduates
            .clone()
            .unwrap_or(PathBuf::from("graduates.csv"));
        let placements_path = self
            .args
            .placements
            .clone()
            .unwrap_or(PathBuf::from("placements.csv"));
        Ok(InitRequest {
            graduate_preferences: read_graduates(open(&graduates_path)?)?,
            placements: read_placements(open(&placements_path)?)?,
        })
    }

    pub fn read_solution(&self, path: &Path) -> Result<Assignment, Error> {
        read_solution(open(path)?)
    }

    /// 命令行上的种子优先于配置文件
    pub fn run_request(&self, config: &Config) -> RunRequest {
        let optimization = &config.optimization;
        RunRequest {
            iterations: optimization.iterations,
            population_size: optimization.population_size,
            manager_weighting: optimization.manager_weighting,
            seed: self.args.seed.or(optimization.seed),
            genetic: optimization.genetic,
        }
    }

    /// 把结果保存为 YAML 和两列的 CSV
    pub fn write_result(&self, result: &RunResult) -> Result<(), Error> {
        create_dir_all(&self.output_dir)?;
        write(
            self.output_dir.join("result.yaml"),
            serde_yaml::to_string(result)?,
        )?;
        let path = self.output_dir.join("solution.csv");
        let mut writer = WriterBuilder::new().from_path(&path)?;
        writer.write_record(["graduate", "placement"])?;
        for (graduate, placement) in result.solution.iter() {
            writer.serialize((graduate, placement))?;
        }
        writer.flush()?;
        println!("结果保存在 {} 中", self.output_dir.display());
        Ok(())
    }
}

impl Interface for CommandLine {
    fn send(&self, message: Message) {
        match message {
            Message::Progress(percent) => println!("progress: {percent}%"),
            Message::Elapsed(time) => println!("第一代用时：{time} μs"),
            Message::Evaluate(lines) => lines.iter().for_each(|line| println!("{line}")),
            Message::Result(result) => {
                println!("graduate\tplacement");
                for (graduate, placement) in result.solution.iter() {
                    println!("{graduate}\t{placement}");
                }
                println!("fitness: {}", result.fitness);
                result.evaluation.iter().for_each(|line| println!("{line}"));
                if let Err(e) = self.write_result(&result) {
                    error!("cannot save the result: {}", e.message);
                }
            }
        }
    }
}
