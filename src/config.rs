use std::convert::TryInto;
use std::ffi::OsStr;
use std::fs::File;
use std::time::Duration;

use justconfig::item::ValueExtractor;
use justconfig::processors::Trim;
use justconfig::sources::env::Env;
use justconfig::sources::text::ConfigText;
use justconfig::ConfPath;
use justconfig::Config;

use crate::config_processors::Unquote;
use crate::error::{require_positive, CfError, Result};
use crate::knn::similarity::BuildOptions;
use crate::knn::Algorithm;

// Set some default values
const DEFAULT_INTERACTIONS_PATH: &str = "u.data";
const DEFAULT_SPLIT_RATIO_M: u32 = 2;
const DEFAULT_HELD_OUT_K: u32 = 1;
const DEFAULT_SPLIT_SEED: u64 = 1;
const DEFAULT_NEIGHBORHOOD_SIZE_K: usize = 10;
const DEFAULT_NUM_ITEMS_TO_RECOMMEND: usize = 10;
const DEFAULT_CHUNK_SIZE: usize = 1024;

pub struct AppConfig {
    pub runtime: RuntimeConfig,
    pub log: LogConfig,
    pub data: DataConfig,
    pub split: SplitConfig,
    pub model: ModelConfig,
    pub build: BuildConfig,
}

pub struct RuntimeConfig {
    pub num_workers: usize,
}

pub struct LogConfig {
    pub level: String,
}

pub struct DataConfig {
    pub interactions_path: String,
    pub delimiter: u8,
    /// Where the evaluator writes per-user recommendations, disabled when `None`.
    pub recommendations_out_path: Option<String>,
}

pub struct SplitConfig {
    pub ratio_m: u32,
    pub held_out_k: u32,
    pub seed: u64,
}

pub struct ModelConfig {
    pub algorithm: Algorithm,
    pub neighborhood_size_k: usize,
    pub num_items_to_recommend: usize,
}

pub struct BuildConfig {
    pub chunk_size: usize,
    pub deadline_secs: u64,
}

impl AppConfig {
    pub fn new(config_path: &str) -> Result<AppConfig> {
        // Initialize config object
        let mut conf = Config::default();

        // Check if there is a config file
        if let Ok(config_file) = File::open(config_path) {
            let config_text = ConfigText::new(config_file, config_path).map_err(|error| {
                CfError::Config(format!("loading {} failed: {}", config_path, error))
            })?;
            conf.add_source(config_text);
        }

        // Define config params from environment variables
        let config_env = Env::new(&[
            (
                ConfPath::from(&["data", "interactions_path"]),
                OsStr::new("INTERACTIONS_DATA"),
            ),
            (
                ConfPath::from(&["runtime", "num_workers"]),
                OsStr::new("NUM_WORKERS"),
            ),
        ]);
        conf.add_source(config_env);

        // Parse into custom config struct
        AppConfig::parse(conf)
    }

    fn parse(conf: Config) -> Result<AppConfig> {
        Ok(AppConfig {
            runtime: RuntimeConfig::parse(&conf, ConfPath::from(&["runtime"])),
            log: LogConfig::parse(&conf, ConfPath::from(&["log"])),
            data: DataConfig::parse(&conf, ConfPath::from(&["data"]))?,
            split: SplitConfig::parse(&conf, ConfPath::from(&["split"]))?,
            model: ModelConfig::parse(&conf, ConfPath::from(&["model"]))?,
            build: BuildConfig::parse(&conf, ConfPath::from(&["build"]))?,
        })
    }
}

impl RuntimeConfig {
    fn parse(conf: &Config, path: ConfPath) -> RuntimeConfig {
        RuntimeConfig {
            num_workers: conf
                .get(path.push("num_workers"))
                .trim()
                .value()
                // Detect number of CPUs
                .unwrap_or_else(|_| {
                    sys_info::cpu_num()
                        .ok()
                        .and_then(|qty_cpus| qty_cpus.try_into().ok())
                        .unwrap_or(1)
                }),
        }
    }
}

impl LogConfig {
    fn parse(conf: &Config, path: ConfPath) -> LogConfig {
        LogConfig {
            level: conf
                .get(path.push("level"))
                .unquote()
                .value()
                .unwrap_or_else(|_| String::from("info")),
        }
    }
}

impl DataConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<DataConfig> {
        let delimiter: String = conf
            .get(path.push("delimiter"))
            .unquote()
            .value()
            .unwrap_or_else(|_| String::from("\\t"));
        let recommendations_out_path: String = conf
            .get(path.push("recommendations_out_path"))
            .unquote()
            .value()
            .unwrap_or_default();

        Ok(DataConfig {
            interactions_path: conf
                .get(path.push("interactions_path"))
                .unquote()
                .value()
                .unwrap_or_else(|_| String::from(DEFAULT_INTERACTIONS_PATH)),
            delimiter: parse_delimiter(&delimiter)?,
            recommendations_out_path: Some(recommendations_out_path)
                .filter(|out_path| !out_path.is_empty()),
        })
    }
}

/// Accepts a single ASCII character, or `\t` / `tab` for a tab.
fn parse_delimiter(value: &str) -> Result<u8> {
    match value {
        "\\t" | "tab" | "\t" => Ok(b'\t'),
        other if other.len() == 1 && other.is_ascii() => Ok(other.as_bytes()[0]),
        other => Err(CfError::Config(format!(
            "delimiter must be a single ASCII character, got '{}'",
            other
        ))),
    }
}

impl SplitConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<SplitConfig> {
        let ratio_m: u32 = conf
            .get(path.push("ratio_m"))
            .trim()
            .value()
            .unwrap_or(DEFAULT_SPLIT_RATIO_M);
        let held_out_k: u32 = conf
            .get(path.push("held_out_k"))
            .trim()
            .value()
            .unwrap_or(DEFAULT_HELD_OUT_K);
        if ratio_m == 0 || held_out_k >= ratio_m {
            return Err(CfError::Config(format!(
                "split requires 0 <= held_out_k < ratio_m, got held_out_k={} ratio_m={}",
                held_out_k, ratio_m
            )));
        }
        Ok(SplitConfig {
            ratio_m,
            held_out_k,
            seed: conf
                .get(path.push("seed"))
                .trim()
                .value()
                .unwrap_or(DEFAULT_SPLIT_SEED),
        })
    }
}

impl ModelConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<ModelConfig> {
        let algorithm: String = conf
            .get(path.push("algorithm"))
            .unquote()
            .value()
            .unwrap_or_else(|_| String::from("item_based"));
        let neighborhood_size_k = conf
            .get(path.push("neighborhood_size_k"))
            .trim()
            .value()
            .unwrap_or(DEFAULT_NEIGHBORHOOD_SIZE_K);
        let num_items_to_recommend = conf
            .get(path.push("num_items_to_recommend"))
            .trim()
            .value()
            .unwrap_or(DEFAULT_NUM_ITEMS_TO_RECOMMEND);

        Ok(ModelConfig {
            algorithm: algorithm.parse()?,
            neighborhood_size_k: require_positive("neighborhood_size_k", neighborhood_size_k)?,
            num_items_to_recommend: require_positive(
                "num_items_to_recommend",
                num_items_to_recommend,
            )?,
        })
    }
}

impl BuildConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<BuildConfig> {
        let chunk_size = conf
            .get(path.push("chunk_size"))
            .trim()
            .value()
            .unwrap_or(DEFAULT_CHUNK_SIZE);
        Ok(BuildConfig {
            chunk_size: require_positive("chunk_size", chunk_size)?,
            deadline_secs: conf
                .get(path.push("deadline_secs"))
                .trim()
                .value()
                .unwrap_or(0),
        })
    }

    pub fn options(&self) -> BuildOptions {
        BuildOptions {
            chunk_size: self.chunk_size,
            deadline: Some(self.deadline_secs)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}
