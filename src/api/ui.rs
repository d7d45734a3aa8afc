// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// GET / - The single-page UI
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
