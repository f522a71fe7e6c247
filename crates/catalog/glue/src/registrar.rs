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

//! Batched partition registration.

use aws_sdk_glue::types::{PartitionError, PartitionInput};
use tracing::debug;

use crate::error::{from_sdk_error, Error, ErrorKind, Result};
use crate::with_catalog_id;

/// Maximum number of partitions Glue accepts in one `BatchCreatePartition`.
pub(crate) const BATCH_CREATE_PARTITION_LIMIT: usize = 100;

/// Error code reported for a partition that is already registered.
const ALREADY_EXISTS: &str = "AlreadyExistsException";

/// Outcome of a single per-partition error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartitionErrorClass {
    /// The partition is already registered; nothing to do.
    AlreadyExists,
    /// Glue reported the partition without any error detail.
    NoDetail,
    Fatal,
}

fn classify(error: &PartitionError) -> PartitionErrorClass {
    match error.error_detail() {
        None => PartitionErrorClass::NoDetail,
        Some(detail) if detail.error_code() == Some(ALREADY_EXISTS) => {
            PartitionErrorClass::AlreadyExists
        }
        Some(_) => PartitionErrorClass::Fatal,
    }
}

/// Fails with the whole error list if any of `errors` carries a detail
/// other than an already registered partition.
pub(crate) fn check_partition_errors(errors: &[PartitionError]) -> Result<()> {
    let mut fatal = false;

    for error in errors {
        match classify(error) {
            PartitionErrorClass::AlreadyExists => {
                debug!(
                    values = ?error.partition_values(),
                    "Partition already exists, skipping"
                );
            }
            PartitionErrorClass::NoDetail => {
                debug!(
                    values = ?error.partition_values(),
                    "Partition error without detail, skipping"
                );
            }
            PartitionErrorClass::Fatal => fatal = true,
        }
    }

    if fatal {
        return Err(Error::new(
            ErrorKind::ServiceApi,
            format!("Failed to create partitions: {:?}", errors),
        ));
    }

    Ok(())
}

/// Registers `inputs` in `database.table`, one `BatchCreatePartition` call
/// per chunk of at most [`BATCH_CREATE_PARTITION_LIMIT`] partitions.
///
/// Chunks are sent in order and the first chunk reporting a fatal error
/// stops the registration. Chunks sent before it stay registered.
pub(crate) async fn create_partitions(
    client: &aws_sdk_glue::Client,
    database: &str,
    table: &str,
    catalog_id: Option<&str>,
    inputs: Vec<PartitionInput>,
) -> Result<()> {
    for (index, chunk) in inputs.chunks(BATCH_CREATE_PARTITION_LIMIT).enumerate() {
        debug!(
            database,
            table,
            chunk = index,
            partitions = chunk.len(),
            "Creating partitions"
        );

        let builder = client
            .batch_create_partition()
            .database_name(database)
            .table_name(table)
            .set_partition_input_list(Some(chunk.to_vec()));
        let builder = with_catalog_id!(builder, catalog_id);

        let resp = builder.send().await.map_err(from_sdk_error)?;

        check_partition_errors(resp.errors()).map_err(|e| {
            e.with_context("database", database)
                .with_context("table", table)
                .with_context("chunk", index.to_string())
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use aws_sdk_glue::types::{ErrorDetail, StorageDescriptor};
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::{json, Value};

    use super::*;
    use crate::utils::{
        create_sdk_config, AWS_ACCESS_KEY_ID, AWS_REGION_NAME, AWS_SECRET_ACCESS_KEY,
    };

    fn partition_error(values: &[&str], code: Option<&str>) -> PartitionError {
        let detail = ErrorDetail::builder()
            .set_error_code(code.map(ToString::to_string))
            .error_message("partition error")
            .build();

        PartitionError::builder()
            .set_partition_values(Some(values.iter().map(ToString::to_string).collect()))
            .error_detail(detail)
            .build()
    }

    #[test]
    fn test_no_errors() {
        assert!(check_partition_errors(&[]).is_ok());
    }

    #[test]
    fn test_only_already_exists_errors() {
        let errors = vec![
            partition_error(&["2020", "10"], Some(ALREADY_EXISTS)),
            partition_error(&["2020", "11"], Some(ALREADY_EXISTS)),
        ];

        assert!(check_partition_errors(&errors).is_ok());
    }

    #[test]
    fn test_other_error_code_is_fatal() {
        let errors = vec![
            partition_error(&["2020", "10"], Some(ALREADY_EXISTS)),
            partition_error(&["2020", "11"], Some("InternalServiceException")),
        ];

        let err = check_partition_errors(&errors).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ServiceApi);
        assert!(err.message().contains("InternalServiceException"));
        assert!(err.message().contains(ALREADY_EXISTS));
        assert!(err.message().contains("\"2020\", \"11\""));
    }

    #[test]
    fn test_error_detail_without_code_is_fatal() {
        let errors = vec![partition_error(&["2020", "10"], None)];

        let err = check_partition_errors(&errors).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ServiceApi);
    }

    #[test]
    fn test_error_without_detail_is_ignored() {
        let errors = vec![
            PartitionError::builder().partition_values("2020").build(),
            partition_error(&["2021"], Some(ALREADY_EXISTS)),
        ];

        assert_eq!(classify(&errors[0]), PartitionErrorClass::NoDetail);
        assert!(check_partition_errors(&errors).is_ok());
    }

    #[test]
    fn test_error_without_detail_next_to_fatal() {
        let errors = vec![
            PartitionError::builder().partition_values("2020").build(),
            partition_error(&["2021"], Some("InternalServiceException")),
        ];

        let err = check_partition_errors(&errors).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ServiceApi);
        assert!(err.message().contains("InternalServiceException"));
    }

    fn ordered_inputs(count: usize) -> Vec<PartitionInput> {
        (0..count)
            .map(|i| {
                PartitionInput::builder()
                    .values(format!("{i:03}"))
                    .storage_descriptor(
                        StorageDescriptor::builder()
                            .location(format!("s3://bucket/id={i:03}/"))
                            .build(),
                    )
                    .build()
            })
            .collect()
    }

    async fn create_client(server: &ServerGuard) -> aws_sdk_glue::Client {
        let props = HashMap::from([
            (AWS_ACCESS_KEY_ID.to_string(), "my_access_id".to_string()),
            (
                AWS_SECRET_ACCESS_KEY.to_string(),
                "my_secret_key".to_string(),
            ),
            (AWS_REGION_NAME.to_string(), "us-east-1".to_string()),
        ]);
        let sdk_config = create_sdk_config(&props, Some(&server.url())).await;

        aws_sdk_glue::Client::new(&sdk_config)
    }

    #[tokio::test]
    async fn test_create_partitions_chunks_keep_order() -> Result<()> {
        let mut server = Server::new_async().await;

        let requests = Arc::new(Mutex::new(Vec::<Value>::new()));
        let captured = requests.clone();
        let batch_mock = server
            .mock("POST", "/")
            .match_header("x-amz-target", "AWSGlue.BatchCreatePartition")
            .match_body(Matcher::PartialJson(json!({
                "DatabaseName": "my_database",
                "TableName": "my_table",
            })))
            .with_status(200)
            .with_body_from_request(move |request| {
                let body = serde_json::from_slice(request.body().unwrap()).unwrap();
                captured.lock().unwrap().push(body);
                b"{}".to_vec()
            })
            .expect(3)
            .create_async()
            .await;

        let client = create_client(&server).await;

        create_partitions(&client, "my_database", "my_table", None, ordered_inputs(250)).await?;

        batch_mock.assert_async().await;

        let chunks = requests
            .lock()
            .unwrap()
            .iter()
            .map(|body| {
                body["PartitionInputList"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|input| {
                        input["StorageDescriptor"]["Location"]
                            .as_str()
                            .unwrap()
                            .to_string()
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        assert_eq!(
            chunks.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![100, 100, 50]
        );
        assert_eq!(
            chunks.concat(),
            (0..250)
                .map(|i| format!("s3://bucket/id={i:03}/"))
                .collect::<Vec<_>>()
        );

        Ok(())
    }
}
