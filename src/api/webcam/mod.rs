// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Webcam mode endpoint
//!
//! Provides POST /v1/webcam. The browser normally posts the frame it grabbed
//! with `getUserMedia`; without one the server-side frame source is used.

pub mod handler;
pub mod request;

pub use handler::webcam_handler;
pub use request::WebcamRequest;
