// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Visual question answering endpoints

pub mod handler;
pub mod request;

pub use handler::{vqa_handler, vqa_upload_handler};
pub use request::VqaRequest;
