use envconfig::Envconfig;

use message_table::dedup::DedupStrategy;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub host: String,

    #[envconfig(from = "BIND_PORT", default = "3301")]
    pub port: u16,

    #[envconfig(default = "sqlite://demo.db")]
    pub database_url: String,

    #[envconfig(default = "messages")]
    pub table_name: String,

    #[envconfig(default = "store")]
    pub dedup_strategy: DedupStrategy,

    /// Version attribute attached to stdin-fed messages; a real transport
    /// carries this attribute itself.
    #[envconfig(default = "1")]
    pub message_version: String,

    #[envconfig(default = "true")]
    pub export_prometheus: bool,
}

impl Config {
    /// Produce a host:port address for binding a TcpListener.
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
