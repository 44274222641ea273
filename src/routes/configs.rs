use axum::{routing::get, Router};

use crate::handlers::config::{
    check_config_overlap, check_rate_overlap, create_config, create_rate, list_configs,
    list_rates, resolve_config, resolve_rate,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/configs", get(list_configs).post(create_config))
        .route("/configs/check-overlap", get(check_config_overlap))
        .route("/configs/resolve", get(resolve_config))
        .route("/cost-rates", get(list_rates).post(create_rate))
        .route("/cost-rates/check-overlap", get(check_rate_overlap))
        .route("/cost-rates/resolve", get(resolve_rate))
}
