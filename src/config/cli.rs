use crate::config::toml_config::TomlConfig;
use crate::config::MetadataConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "movie-meta")]
#[command(about = "Look up movie metadata from KMDB and OMDb and export it as a spreadsheet")]
pub struct CliConfig {
    /// Single movie title to look up
    #[arg(short, long)]
    pub title: Option<String>,

    /// Spreadsheet (.xlsx) or CSV file whose first column holds titles
    #[arg(short, long)]
    pub input: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_dir: String,

    /// Path to TOML configuration file; environment variables are used otherwise
    #[arg(short, long)]
    pub config: Option<String>,

    /// Reject provider results whose title does not match the query
    #[arg(long)]
    pub strict: bool,

    /// Route provider calls through the CORS proxy
    #[arg(long)]
    pub use_proxy: bool,

    /// Treat the first row of the input file as a header
    #[arg(long)]
    pub skip_header: bool,

    /// Print the resolved records as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 載入設定檔（或環境變數），再套用命令列覆蓋
    pub fn metadata_config(&self) -> Result<MetadataConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?.into_metadata_config(),
            None => MetadataConfig::from_env(),
        };

        if self.strict {
            config.strict_title_match = true;
        }
        if self.use_proxy {
            config.proxy.use_proxy = true;
        }
        if self.skip_header {
            config.skip_header = true;
        }

        Ok(config)
    }

    /// 命令列未指定時使用設定檔中的輸出目錄
    pub fn output_directory(&self) -> Result<String> {
        if self.output_dir != "./output" {
            return Ok(self.output_dir.clone());
        }
        match &self.config {
            Some(path) => Ok(TomlConfig::from_file(path)?
                .output_directory()
                .unwrap_or(&self.output_dir)
                .to_string()),
            None => Ok(self.output_dir.clone()),
        }
    }
}
