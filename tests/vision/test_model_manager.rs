// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model cache behaviour: identity, CPU fallback, retry after failure

use std::sync::Arc;
use std::time::Duration;
use vision2lang::vision::{DevicePreference, ExecutionDevice, LoadError, VisionTask};

use crate::common::{manager_with, FakeLoader};

#[tokio::test]
async fn test_get_model_returns_cached_handle() {
    let loader = Arc::new(FakeLoader::new());
    let manager = manager_with(loader.clone(), DevicePreference::Cpu);

    let first = manager.get_model(VisionTask::Caption).await.unwrap();
    let second = manager.get_model(VisionTask::Caption).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(loader.load_count(), 1);
    assert_eq!(first.loaded_at, second.loaded_at);
}

#[tokio::test]
async fn test_tasks_are_cached_independently() {
    let loader = Arc::new(FakeLoader::new());
    let manager = manager_with(loader.clone(), DevicePreference::Cpu);

    let caption = manager.get_model(VisionTask::Caption).await.unwrap();
    assert!(manager.loaded(VisionTask::Vqa).is_none());

    let vqa = manager.get_model(VisionTask::Vqa).await.unwrap();
    assert_eq!(caption.model_id, "fake/caption");
    assert_eq!(vqa.model_id, "fake/vqa");
    assert_eq!(loader.load_count(), 2);
}

#[tokio::test]
async fn test_out_of_memory_falls_back_to_cpu() {
    let loader = Arc::new(FakeLoader::new().with_oom_on_accelerator());
    let manager = manager_with(loader.clone(), DevicePreference::Cuda);

    let handle = manager.get_model(VisionTask::Caption).await.unwrap();

    assert_eq!(handle.device, ExecutionDevice::Cpu);
    assert_eq!(
        loader.attempted_devices(),
        vec![ExecutionDevice::Cuda, ExecutionDevice::Cpu]
    );

    // Fallback happens at load time only
    manager.get_model(VisionTask::Caption).await.unwrap();
    assert_eq!(loader.attempted_devices().len(), 2);
}

#[tokio::test]
async fn test_cpu_failure_is_not_retried() {
    let loader = Arc::new(FakeLoader::new().with_fetch_failures(1));
    let manager = manager_with(loader.clone(), DevicePreference::Cpu);

    let err = manager.get_model(VisionTask::Vqa).await.unwrap_err();
    assert!(matches!(err, LoadError::Fetch { .. }));
    assert_eq!(loader.attempted_devices(), vec![ExecutionDevice::Cpu]);
    assert!(manager.loaded(VisionTask::Vqa).is_none());
}

#[tokio::test]
async fn test_failed_load_is_retried_on_next_request() {
    let loader = Arc::new(FakeLoader::new().with_fetch_failures(1));
    let manager = manager_with(loader.clone(), DevicePreference::Cpu);

    assert!(manager.get_model(VisionTask::Caption).await.is_err());
    let handle = manager.get_model(VisionTask::Caption).await.unwrap();
    assert_eq!(handle.task, VisionTask::Caption);
    assert_eq!(loader.load_count(), 1);
}

#[tokio::test]
async fn test_concurrent_first_use_loads_once() {
    let loader = Arc::new(FakeLoader::new().with_delay(Duration::from_millis(50)));
    let manager = manager_with(loader.clone(), DevicePreference::Cpu);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.get_model(VisionTask::Caption).await })
        })
        .collect();

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap().unwrap());
    }

    assert_eq!(loader.load_count(), 1);
    assert!(handles.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[tokio::test]
async fn test_list_models_and_preload() {
    let loader = Arc::new(FakeLoader::new());
    let manager = manager_with(loader.clone(), DevicePreference::Cpu);

    let before = manager.list_models();
    assert!(before.iter().all(|m| !m.loaded && m.device.is_none()));

    let handles = manager.preload().await.unwrap();
    assert_eq!(handles.len(), 2);

    let after = manager.list_models();
    assert!(after.iter().all(|m| m.loaded));
    assert_eq!(after[0].device, Some(ExecutionDevice::Cpu));
    assert_eq!(loader.load_count(), 2);
}
