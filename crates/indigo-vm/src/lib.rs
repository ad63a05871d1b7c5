//! VM API client and data models for WebArena Indigo.
//!
//! Provides typed structures and an asynchronous client for the
//! `/webarenaIndigo/v1/vm` endpoints: instance creation, region and instance
//! type listings, and SSH key status.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{VmClient, VmClientBuilder};
pub use models::{
    CreateImportUrlInstanceRequest, CreateInstanceRequest, CreateInstanceResponse,
    CreateSnapshotInstanceRequest, CreateWindowsInstanceRequest, Instance, InstanceDate,
    InstanceType, InstanceTypeListResponse, Region, RegionListResponse, SshKey,
    SshKeyListResponse,
};

/// Convenient result alias that reuses the shared Indigo error type.
pub type Result<T> = indigo_core::Result<T>;
