//! SQL generation for the warehouse staging tables

use crate::endpoint::{ADMISSIONS, FOLLOWINGS, STUDENTS};
use crate::error::{Error, Result};

/// Staging table prefix; endpoint `students` lives in `stg_og__students`
pub const STAGING_PREFIX: &str = "stg_og__";

/// Student id column, shared by every staging table that links to a student
pub const STUDENT_ID_COLUMN: &str = "overgrad_student_id";

/// Id column of an endpoint's staging table
pub fn id_column(endpoint: &str) -> Result<&'static str> {
    match endpoint {
        STUDENTS => Ok(STUDENT_ID_COLUMN),
        ADMISSIONS => Ok("overgrad_application_id"),
        FOLLOWINGS => Ok("overgrad_following_id"),
        other => Err(Error::warehouse(format!(
            "no staging table for endpoint '{other}'"
        ))),
    }
}

/// Table naming for a warehouse, optionally qualified as
/// `project.dataset.table`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarehouseTables {
    /// Catalog (project) qualifier
    pub project: Option<String>,
    /// Schema (dataset) qualifier
    pub dataset: Option<String>,
}

impl WarehouseTables {
    /// Create table naming with optional qualifiers
    pub fn new(project: Option<String>, dataset: Option<String>) -> Self {
        Self { project, dataset }
    }

    /// Fully qualified, quoted staging table name for an endpoint
    pub fn table(&self, endpoint: &str) -> String {
        let name = quote(&format!("{STAGING_PREFIX}{endpoint}"));
        match (&self.project, &self.dataset) {
            (Some(project), Some(dataset)) => {
                format!("{}.{}.{name}", quote(project), quote(dataset))
            }
            (None, Some(dataset)) => format!("{}.{name}", quote(dataset)),
            _ => name,
        }
    }

    /// Ids in the grad-year scope of an endpoint. Takes one parameter: the
    /// graduation year.
    ///
    /// Students are filtered directly; admissions and followings are joined
    /// to the student table on the student id.
    pub fn scope_ids_sql(&self, endpoint: &str) -> Result<String> {
        let column = id_column(endpoint)?;
        if endpoint == STUDENTS {
            return Ok(format!(
                "SELECT CAST({column} AS VARCHAR) FROM {} WHERE graduation_year = ?",
                self.table(STUDENTS)
            ));
        }

        Ok(format!(
            "SELECT CAST(data.{column} AS VARCHAR) FROM {} AS data \
             LEFT JOIN {} AS students \
             ON data.{STUDENT_ID_COLUMN} = students.{STUDENT_ID_COLUMN} \
             WHERE students.graduation_year = ?",
            self.table(endpoint),
            self.table(STUDENTS)
        ))
    }

    /// Ids of an endpoint's rows that belong to one student. Takes one
    /// parameter: the student id as a string.
    pub fn student_children_sql(&self, endpoint: &str) -> Result<String> {
        if endpoint == STUDENTS {
            return Err(Error::warehouse("students have no parent student"));
        }
        let column = id_column(endpoint)?;
        Ok(format!(
            "SELECT CAST({column} AS VARCHAR) FROM {} \
             WHERE CAST({STUDENT_ID_COLUMN} AS VARCHAR) = ? \
             ORDER BY 1",
            self.table(endpoint)
        ))
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
