// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Partition and column registration for the AWS Glue Data Catalog.
//!
//! # Example
//!
//! ```rust, no_run
//! use std::collections::HashMap;
//!
//! use glue_partition_registrar::{GlueCatalog, GlueCatalogConfig, PartitionOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let catalog = GlueCatalog::new(GlueCatalogConfig::builder().build()).await;
//!
//!     catalog
//!         .add_parquet_partitions(
//!             "default",
//!             "my_table",
//!             HashMap::from([(
//!                 "s3://bucket/prefix/y=2020/m=10/".to_string(),
//!                 vec!["2020".to_string(), "10".to_string()],
//!             )]),
//!             &PartitionOptions::default(),
//!         )
//!         .await
//!         .unwrap();
//! }
//! ```

#![deny(missing_docs)]

mod catalog;
mod column_type;
mod definition;
mod error;
mod registrar;
mod utils;

pub use catalog::*;
pub use definition::{
    partition_input, BucketingInfo, CsvSerDe, FileFormat, JsonSerDe, PartitionOptions,
};
pub use error::{Error, ErrorKind, Result};
pub use utils::{
    AWS_ACCESS_KEY_ID, AWS_PROFILE_NAME, AWS_REGION_NAME, AWS_SECRET_ACCESS_KEY, AWS_SESSION_TOKEN,
};
