pub mod api {
    pub mod models {
        pub mod files;
        pub mod patent;
        pub mod task;
    }
    pub mod client;
    pub mod error;
}

pub mod config;
pub mod logger;
pub mod qr_display;
pub mod utils;
