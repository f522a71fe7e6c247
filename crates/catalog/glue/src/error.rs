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

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};

use anyhow::anyhow;
use aws_sdk_glue::error::{BuildError, ProvideErrorMetadata, SdkError};

/// Result that is a wrapper of `Result<T, glue_partition_registrar::Error>`
pub type Result<T> = std::result::Result<T, Error>;

/// ErrorKind is all kinds of Error raised while registering catalog metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Something we don't know how to handle, for example a transport
    /// failure from the underlying SDK client.
    Unexpected,

    /// Input is invalid and was rejected before reaching the catalog.
    ///
    /// Returned for unsupported column types and for table definitions
    /// that cannot be turned back into a writable table input.
    DataInvalid,

    /// The catalog service reported one or more errors for the request.
    ///
    /// The message carries the raw error payload returned by the service.
    ServiceApi,

    /// The table does not exist in the catalog.
    TableNotFound,
}

impl ErrorKind {
    /// Convert self into static str.
    pub fn into_static(self) -> &'static str {
        self.into()
    }
}

impl From<ErrorKind> for &'static str {
    fn from(v: ErrorKind) -> &'static str {
        match v {
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::DataInvalid => "DataInvalid",
            ErrorKind::ServiceApi => "ServiceApi",
            ErrorKind::TableNotFound => "TableNotFound",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.into_static())
    }
}

/// Error is the error struct returned by all functions of this crate.
///
/// Via `Display` the error is printed in a single line:
///
/// ```shell
/// ServiceApi, context: { database: db, table: tbl } => Failed to create partitions: [...]
/// ```
///
/// Via `Debug` it is printed over multiple lines, including the source and
/// the backtrace when one was captured.
pub struct Error {
    kind: ErrorKind,
    message: String,

    context: Vec<(&'static str, String)>,

    source: Option<anyhow::Error>,
    backtrace: Backtrace,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if !self.context.is_empty() {
            write!(f, ", context: {{ ")?;
            write!(
                f,
                "{}",
                self.context
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        if let Some(source) = &self.source {
            write!(f, ", source: {source}")?;
        }

        Ok(())
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("message", &self.message);
            de.field("context", &self.context);
            de.field("source", &self.source);
            de.field("backtrace", &self.backtrace);
            return de.finish();
        }

        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        writeln!(f)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "   {k}: {v}")?;
            }
        }
        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "Source: {source:#}")?;
        }

        if self.backtrace.status() == BacktraceStatus::Captured {
            writeln!(f)?;
            writeln!(f, "Backtrace:")?;
            writeln!(f, "{}", self.backtrace)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|v| v.as_ref())
    }
}

impl Error {
    /// Create a new Error with error kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Vec::default(),

            source: None,
            // `Backtrace::capture()` is zero cost unless backtraces are enabled.
            backtrace: Backtrace::capture(),
        }
    }

    /// Add more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Set source for error.
    ///
    /// # Notes
    ///
    /// If the source has been set, we will raise a panic here.
    pub fn with_source(mut self, src: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "the source error has been set");

        self.source = Some(src.into());
        self
    }

    #[cfg(test)]
    fn with_backtrace(mut self, backtrace: Backtrace) -> Self {
        self.backtrace = backtrace;
        self
    }

    /// Return error's kind.
    ///
    /// Users can use this method to check error's kind and take actions.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return error's message.
    #[inline]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Return the context attached to this error.
    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }
}

/// Format an aws sdk error into a crate error.
pub(crate) fn from_sdk_error<E>(error: SdkError<E>) -> Error
where
    E: Debug,
{
    Error::new(
        ErrorKind::Unexpected,
        "Operation failed for hitting aws sdk error".to_string(),
    )
    .with_source(anyhow!("aws sdk error: {:?}", error))
}

/// Format an aws sdk error into a crate error, keeping service side
/// failures apart from transport failures.
pub(crate) fn from_service_error<E>(error: SdkError<E>) -> Error
where
    E: ProvideErrorMetadata + Debug,
{
    let Some((code, message)) = error.as_service_error().map(|e| {
        (
            e.code().unwrap_or("Unknown").to_string(),
            e.message().unwrap_or_default().to_string(),
        )
    }) else {
        return from_sdk_error(error);
    };

    Error::new(
        ErrorKind::ServiceApi,
        format!("Catalog service rejected the request: {code}: {message}"),
    )
    .with_context("error_code", code)
    .with_source(anyhow!("aws sdk error: {:?}", error))
}

/// Format an aws build error into a crate error.
pub(crate) fn from_aws_build_error(error: BuildError) -> Error {
    Error::new(
        ErrorKind::Unexpected,
        "Operation failed for hitting aws build error".to_string(),
    )
    .with_source(anyhow!("aws build error: {:?}", error))
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    fn generate_error_with_backtrace_disabled() -> Error {
        Error::new(
            ErrorKind::ServiceApi,
            "Failed to create partitions".to_string(),
        )
        .with_context("database", "db".to_string())
        .with_context("table", "tbl".to_string())
        .with_source(anyhow!("access denied"))
        .with_backtrace(Backtrace::disabled())
    }

    #[test]
    fn test_error_display_without_backtrace() {
        let s = format!("{}", generate_error_with_backtrace_disabled());
        assert_eq!(
            s,
            r#"ServiceApi, context: { database: db, table: tbl } => Failed to create partitions, source: access denied"#
        )
    }

    #[test]
    fn test_error_debug_without_backtrace() {
        let s = format!("{:?}", generate_error_with_backtrace_disabled());
        assert_eq!(
            s,
            r#"ServiceApi => Failed to create partitions

Context:
   database: db
   table: tbl

Source: access denied
"#
        )
    }

    #[test]
    fn test_build_error_is_unexpected() {
        let error = from_aws_build_error(BuildError::missing_field("name", "missing name"));

        assert_eq!(error.kind(), ErrorKind::Unexpected);
        assert!(error.to_string().contains("missing name"));
    }
}
