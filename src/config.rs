use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub dispatch_interval_secs: u64,
    pub dispatch_batch_size: i32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            dispatch_interval_secs: env::var("DISPATCH_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("DISPATCH_INTERVAL_SECS must be a number"),
            dispatch_batch_size: env::var("DISPATCH_BATCH_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("DISPATCH_BATCH_SIZE must be a number"),
        }
    }
}
