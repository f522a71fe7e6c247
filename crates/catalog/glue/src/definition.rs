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

//! Builders for the partition and table definitions sent to Glue.

use std::collections::HashMap;

use aws_sdk_glue::types::builders::TableInputBuilder;
use aws_sdk_glue::types::{Column, PartitionInput, SerDeInfo, StorageDescriptor, Table, TableInput};
use typed_builder::TypedBuilder;

use crate::error::{from_aws_build_error, Error, ErrorKind, Result};

/// Input format shared by delimited text and JSON lines.
const TEXT_INPUT_FORMAT: &str = "org.apache.hadoop.mapred.TextInputFormat";
/// Output format shared by delimited text and JSON lines.
const TEXT_OUTPUT_FORMAT: &str = "org.apache.hadoop.hive.ql.io.HiveIgnoreKeyTextOutputFormat";
const CSV_SERDE_LIBRARY: &str = "org.apache.hadoop.hive.serde2.lazy.LazySimpleSerDe";
const JSON_SERDE_LIBRARY: &str = "org.openx.data.jsonserde.JsonSerDe";

const PARQUET_INPUT_FORMAT: &str = "org.apache.hadoop.hive.ql.io.parquet.MapredParquetInputFormat";
const PARQUET_OUTPUT_FORMAT: &str =
    "org.apache.hadoop.hive.ql.io.parquet.MapredParquetOutputFormat";
const PARQUET_SERDE_LIBRARY: &str = "org.apache.hadoop.hive.ql.io.parquet.serde.ParquetHiveSerDe";

const ORC_INPUT_FORMAT: &str = "org.apache.hadoop.hive.ql.io.orc.OrcInputFormat";
const ORC_OUTPUT_FORMAT: &str = "org.apache.hadoop.hive.ql.io.orc.OrcOutputFormat";
const ORC_SERDE_LIBRARY: &str = "org.apache.hadoop.hive.ql.io.orc.OrcSerde";

/// SerDe parameter holding the field delimiter of delimited text.
const FIELD_DELIM: &str = "field.delim";
/// SerDe parameter holding the escape character of delimited text.
const ESCAPE_DELIM: &str = "escape.delim";
/// SerDe parameter used by the columnar formats.
const SERIALIZATION_FORMAT: &str = "serialization.format";

/// Number of buckets Glue expects when a partition is not bucketed.
const NO_BUCKETS: i32 = -1;

/// Bucketing of a partition: the columns rows are hashed on, and the
/// number of buckets they are distributed across.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketingInfo {
    /// Columns used for bucketing.
    pub columns: Vec<String>,
    /// Number of buckets.
    pub num_buckets: i32,
}

impl BucketingInfo {
    /// Creates a new `BucketingInfo`.
    pub fn new(columns: impl IntoIterator<Item = impl Into<String>>, num_buckets: i32) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            num_buckets,
        }
    }
}

/// Options shared by every file format when registering partitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, TypedBuilder)]
pub struct PartitionOptions {
    /// Bucketing applied to every partition.
    #[builder(default, setter(strip_option))]
    pub bucketing_info: Option<BucketingInfo>,
    /// Compression style (`gzip`, `snappy`, ...). Any value marks the data
    /// as compressed.
    #[builder(default, setter(strip_option, into))]
    pub compression: Option<String>,
    /// Ordered column names and types. Only materialized columns, not
    /// partition columns.
    #[builder(default, setter(strip_option))]
    pub columns_types: Option<Vec<(String, String)>>,
    /// Parameters attached to every partition.
    #[builder(default, setter(strip_option))]
    pub partitions_parameters: Option<HashMap<String, String>>,
    /// Catalog to register partitions in. Overrides the catalog id of
    /// the catalog configuration.
    #[builder(default, setter(strip_option, into))]
    pub catalog_id: Option<String>,
}

/// SerDe settings of delimited text partitions.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct CsvSerDe {
    /// Field delimiter.
    #[builder(default = ",".to_string(), setter(into))]
    pub sep: String,
    /// SerDe library, `LazySimpleSerDe` when unset.
    #[builder(default, setter(strip_option, into))]
    pub serde_library: Option<String>,
    /// SerDe parameters, `{"field.delim": sep, "escape.delim": "\\"}`
    /// when unset.
    #[builder(default, setter(strip_option))]
    pub serde_parameters: Option<HashMap<String, String>>,
}

impl Default for CsvSerDe {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// SerDe settings of JSON lines partitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, TypedBuilder)]
pub struct JsonSerDe {
    /// SerDe library, `org.openx.data.jsonserde.JsonSerDe` when unset.
    #[builder(default, setter(strip_option, into))]
    pub serde_library: Option<String>,
    /// SerDe parameters, empty when unset.
    #[builder(default, setter(strip_option))]
    pub serde_parameters: Option<HashMap<String, String>>,
}

/// File format of the data behind a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFormat {
    /// Delimited text.
    Csv(CsvSerDe),
    /// Line delimited JSON.
    Json(JsonSerDe),
    /// Apache Parquet.
    Parquet,
    /// Apache ORC.
    Orc,
}

impl FileFormat {
    fn input_format(&self) -> &'static str {
        match self {
            FileFormat::Csv(_) | FileFormat::Json(_) => TEXT_INPUT_FORMAT,
            FileFormat::Parquet => PARQUET_INPUT_FORMAT,
            FileFormat::Orc => ORC_INPUT_FORMAT,
        }
    }

    fn output_format(&self) -> &'static str {
        match self {
            FileFormat::Csv(_) | FileFormat::Json(_) => TEXT_OUTPUT_FORMAT,
            FileFormat::Parquet => PARQUET_OUTPUT_FORMAT,
            FileFormat::Orc => ORC_OUTPUT_FORMAT,
        }
    }

    fn serde_info(&self) -> SerDeInfo {
        let (library, parameters) = match self {
            FileFormat::Csv(serde) => (
                serde.serde_library.as_deref().unwrap_or(CSV_SERDE_LIBRARY),
                serde.serde_parameters.clone().unwrap_or_else(|| {
                    HashMap::from([
                        (FIELD_DELIM.to_string(), serde.sep.clone()),
                        (ESCAPE_DELIM.to_string(), "\\".to_string()),
                    ])
                }),
            ),
            FileFormat::Json(serde) => (
                serde.serde_library.as_deref().unwrap_or(JSON_SERDE_LIBRARY),
                serde.serde_parameters.clone().unwrap_or_default(),
            ),
            FileFormat::Parquet => (
                PARQUET_SERDE_LIBRARY,
                HashMap::from([(SERIALIZATION_FORMAT.to_string(), "1".to_string())]),
            ),
            FileFormat::Orc => (
                ORC_SERDE_LIBRARY,
                HashMap::from([(SERIALIZATION_FORMAT.to_string(), "1".to_string())]),
            ),
        };

        SerDeInfo::builder()
            .serialization_library(library)
            .set_parameters(Some(parameters))
            .build()
    }
}

/// Builds the `PartitionInput` registering the data at `location` as the
/// partition identified by `values`.
pub fn partition_input(
    format: &FileFormat,
    location: impl Into<String>,
    values: Vec<String>,
    options: &PartitionOptions,
) -> Result<PartitionInput> {
    let (number_of_buckets, bucket_columns) = match &options.bucketing_info {
        Some(bucketing) => (bucketing.num_buckets, bucketing.columns.clone()),
        None => (NO_BUCKETS, Vec::new()),
    };

    let columns = options
        .columns_types
        .as_ref()
        .map(|columns_types| {
            columns_types
                .iter()
                .map(|(name, r#type)| {
                    Column::builder()
                        .name(name)
                        .r#type(r#type)
                        .build()
                        .map_err(from_aws_build_error)
                })
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;

    let storage_descriptor = StorageDescriptor::builder()
        .location(location)
        .input_format(format.input_format())
        .output_format(format.output_format())
        .compressed(options.compression.is_some())
        .serde_info(format.serde_info())
        .stored_as_sub_directories(false)
        .number_of_buckets(number_of_buckets)
        .set_bucket_columns(Some(bucket_columns))
        .set_columns(columns)
        .build();

    Ok(PartitionInput::builder()
        .set_values(Some(values))
        .storage_descriptor(storage_descriptor)
        .set_parameters(Some(
            options.partitions_parameters.clone().unwrap_or_default(),
        ))
        .build())
}

/// Returns the fields of `table` that `UpdateTable` accepts back.
///
/// Server managed fields like `DatabaseName`, `CreateTime` or `VersionId`
/// are dropped.
fn updatable_table_input(table: &Table) -> TableInputBuilder {
    TableInput::builder()
        .name(table.name.clone())
        .set_description(table.description.clone())
        .set_owner(table.owner.clone())
        .set_last_access_time(table.last_access_time)
        .set_last_analyzed_time(table.last_analyzed_time)
        .retention(table.retention)
        .set_storage_descriptor(table.storage_descriptor.clone())
        .set_partition_keys(table.partition_keys.clone())
        .set_view_original_text(table.view_original_text.clone())
        .set_view_expanded_text(table.view_expanded_text.clone())
        .set_table_type(table.table_type.clone())
        .set_parameters(table.parameters.clone())
        .set_target_table(table.target_table.clone())
}

/// Builds the `TableInput` of `table` with `column` appended to its
/// storage descriptor columns.
pub(crate) fn table_input_with_column(table: &Table, column: Column) -> Result<TableInput> {
    let mut storage_descriptor = table.storage_descriptor.clone().ok_or_else(|| {
        Error::new(
            ErrorKind::DataInvalid,
            format!("Table {} has no storage descriptor", table.name),
        )
    })?;

    storage_descriptor
        .columns
        .get_or_insert_with(Vec::new)
        .push(column);

    updatable_table_input(table)
        .storage_descriptor(storage_descriptor)
        .build()
        .map_err(from_aws_build_error)
}
