// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod caption;
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod multipart;
pub mod response;
pub mod ui;
pub mod vqa;
pub mod webcam;

pub use errors::{ApiError, ErrorResponse};
pub use http_server::{create_app, start_server, AppState};
pub use response::{FrameInfo, WorkflowResponse};
