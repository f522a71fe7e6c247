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

use std::collections::HashMap;
use std::fmt::Debug;

use aws_sdk_glue::types::Column;
use tracing::{debug, info};
use typed_builder::TypedBuilder;

use crate::column_type::validate_column_type;
use crate::definition::{
    partition_input, table_input_with_column, CsvSerDe, FileFormat, JsonSerDe, PartitionOptions,
};
use crate::error::{from_aws_build_error, from_sdk_error, from_service_error, Error, ErrorKind};
use crate::registrar::create_partitions;
use crate::utils::{create_sdk_config, sanitize_table_name};
use crate::{with_catalog_id, Result};

#[derive(Debug, TypedBuilder)]
/// Glue Catalog configuration
pub struct GlueCatalogConfig {
    #[builder(default, setter(strip_option, into))]
    uri: Option<String>,
    #[builder(default, setter(strip_option, into))]
    catalog_id: Option<String>,
    #[builder(default)]
    props: HashMap<String, String>,
}

struct GlueClient(aws_sdk_glue::Client);

/// Glue Catalog
pub struct GlueCatalog {
    config: GlueCatalogConfig,
    client: GlueClient,
}

impl Debug for GlueCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlueCatalog")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GlueCatalog {
    /// Create a new glue catalog
    pub async fn new(config: GlueCatalogConfig) -> Self {
        let sdk_config = create_sdk_config(&config.props, config.uri.as_ref()).await;

        let client = aws_sdk_glue::Client::new(&sdk_config);

        GlueCatalog {
            config,
            client: GlueClient(client),
        }
    }

    /// Add partitions (metadata) to a CSV table.
    ///
    /// `partitions_values` maps S3 locations to the partition values stored
    /// there, e.g. `{"s3://bucket/prefix/y=2020/m=10/": ["2020", "10"]}`.
    pub async fn add_csv_partitions(
        &self,
        database: &str,
        table: &str,
        partitions_values: HashMap<String, Vec<String>>,
        serde: CsvSerDe,
        options: &PartitionOptions,
    ) -> Result<()> {
        self.add_partitions(
            database,
            table,
            &FileFormat::Csv(serde),
            partitions_values,
            options,
        )
        .await
    }

    /// Add partitions (metadata) to a JSON table.
    pub async fn add_json_partitions(
        &self,
        database: &str,
        table: &str,
        partitions_values: HashMap<String, Vec<String>>,
        serde: JsonSerDe,
        options: &PartitionOptions,
    ) -> Result<()> {
        self.add_partitions(
            database,
            table,
            &FileFormat::Json(serde),
            partitions_values,
            options,
        )
        .await
    }

    /// Add partitions (metadata) to a Parquet table.
    pub async fn add_parquet_partitions(
        &self,
        database: &str,
        table: &str,
        partitions_values: HashMap<String, Vec<String>>,
        options: &PartitionOptions,
    ) -> Result<()> {
        self.add_partitions(
            database,
            table,
            &FileFormat::Parquet,
            partitions_values,
            options,
        )
        .await
    }

    /// Add partitions (metadata) to an ORC table.
    pub async fn add_orc_partitions(
        &self,
        database: &str,
        table: &str,
        partitions_values: HashMap<String, Vec<String>>,
        options: &PartitionOptions,
    ) -> Result<()> {
        self.add_partitions(database, table, &FileFormat::Orc, partitions_values, options)
            .await
    }

    /// Add partitions (metadata) of any file format.
    ///
    /// Partitions that are already registered are skipped. Any other
    /// error reported by the catalog aborts with [`ErrorKind::ServiceApi`];
    /// partitions registered by earlier batches are kept.
    pub async fn add_partitions(
        &self,
        database: &str,
        table: &str,
        format: &FileFormat,
        partitions_values: HashMap<String, Vec<String>>,
        options: &PartitionOptions,
    ) -> Result<()> {
        let table = sanitize_table_name(table)?;

        if partitions_values.is_empty() {
            debug!(database, table = %table, "No partitions to add");
            return Ok(());
        }

        let count = partitions_values.len();
        let inputs = partitions_values
            .into_iter()
            .map(|(location, values)| partition_input(format, location, values, options))
            .collect::<Result<Vec<_>>>()?;

        let catalog_id = options
            .catalog_id
            .as_deref()
            .or(self.config.catalog_id.as_deref());

        create_partitions(&self.client.0, database, &table, catalog_id, inputs).await?;

        info!(database, table = %table, partitions = count, "Added partitions");

        Ok(())
    }

    /// Add a column to a table.
    ///
    /// The table definition is read, extended and written back as a whole,
    /// so concurrent updates of the same table may overwrite each other.
    ///
    /// `catalog_id` overrides the catalog id of the configuration.
    pub async fn add_column(
        &self,
        database: &str,
        table: &str,
        column_name: &str,
        column_type: &str,
        column_comment: Option<&str>,
        catalog_id: Option<&str>,
    ) -> Result<()> {
        validate_column_type(column_type)?;

        let catalog_id = catalog_id.or(self.config.catalog_id.as_deref());

        let builder = self
            .client
            .0
            .get_table()
            .database_name(database)
            .name(table);
        let builder = with_catalog_id!(builder, catalog_id);

        let resp = builder.send().await.map_err(|err| {
            if err
                .as_service_error()
                .map(|e| e.is_entity_not_found_exception())
                == Some(true)
            {
                return Error::new(
                    ErrorKind::TableNotFound,
                    format!("Table {}.{} does not exist", database, table),
                );
            }
            from_sdk_error(err)
        })?;

        let current = resp.table().ok_or_else(|| {
            Error::new(
                ErrorKind::DataInvalid,
                format!("Table {}.{} returned no definition", database, table),
            )
        })?;

        let column = Column::builder()
            .name(column_name)
            .r#type(column_type)
            .set_comment(column_comment.map(ToString::to_string))
            .build()
            .map_err(from_aws_build_error)?;

        let table_input = table_input_with_column(current, column)?;

        let builder = self
            .client
            .0
            .update_table()
            .database_name(database)
            .table_input(table_input);
        let builder = with_catalog_id!(builder, catalog_id);

        builder.send().await.map_err(from_service_error)?;

        info!(database, table, column = column_name, "Added column");

        Ok(())
    }
}
