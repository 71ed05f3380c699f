use std::env;
use dotenvy::dotenv;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub data_dir: String,

    // Hosted table-store
    pub remote_url: String,
    pub remote_api_key: String,

    // Optional JSON file overriding the built-in branch table
    pub shops_file: Option<String>,

    // Geofence policy; 1500 m is the current production radius
    pub geofence_radius_m: f64,

    // Result screen auto-return delay
    pub result_reset_secs: u64,

    // Rate limiting
    pub rate_verify_per_min: u32,
    pub rate_terminal_per_min: u32,

    // Mount point for the whole surface; empty keeps routes at the root
    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),

            remote_url: env::var("REMOTE_URL").expect("REMOTE_URL must be set"),
            remote_api_key: env::var("REMOTE_API_KEY").expect("REMOTE_API_KEY must be set"),

            shops_file: env::var("SHOPS_FILE").ok(),

            geofence_radius_m: env::var("GEOFENCE_RADIUS_M")
                .unwrap_or_else(|_| "1500".to_string())
                .parse()
                .unwrap(),
            result_reset_secs: env::var("RESULT_RESET_SECS")
                .unwrap_or_else(|_| "6".to_string())
                .parse()
                .unwrap(),

            rate_verify_per_min: env::var("RATE_VERIFY_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_terminal_per_min: env::var("RATE_TERMINAL_PER_MIN")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "".to_string()),
        }
    }
}
