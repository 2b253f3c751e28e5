use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::shared::config::model::{load_settings, Settings};

pub static CONFIG: Lazy<Arc<Settings>> =
    Lazy::new(|| Arc::new(load_settings().expect("Failed to load configuration")));
