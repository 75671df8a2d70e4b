use std::sync::Arc;

use axum::{extract::State, response::Html};

use crate::router::ExporterState;

pub async fn landing_page(State(state): State<Arc<ExporterState>>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>Aliyun Exporter</title></head>\n\
         <body>\n\
         <h1>Aliyun Exporter</h1>\n\
         <p><a href='{path}'>Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        path = state.telemetry_path
    ))
}
