//! Proposal / concept-note pipeline rows.

use chrono::NaiveDate;
use rusqlite::params;

use crate::db::calendar::DATE_FORMAT;
use crate::db::store::{self, Filter, Table, Value};
use crate::db::types::{DbError, DbProposal, ProposalResult};
use crate::db::DashboardDb;

/// Caller-supplied proposal fields; the id is always store-assigned.
#[derive(Debug, Clone)]
pub struct NewProposal {
    pub department_code: String,
    /// `"proposal"` or `"concept note"`.
    pub kind: String,
    pub country_name: String,
    pub donor: Option<String>,
    pub date_submission: NaiveDate,
    pub result: ProposalResult,
    /// Comma-joined advisor short names.
    pub sal_support: Option<String>,
    pub country_focal: Option<String>,
    pub description: Option<String>,
}

impl NewProposal {
    fn editable_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("type", Value::from(self.kind.clone())),
            ("country_name", Value::from(self.country_name.clone())),
            ("donor", Value::from(self.donor.clone())),
            (
                "date_submission",
                Value::from(self.date_submission.format(DATE_FORMAT).to_string()),
            ),
            ("result", Value::from(self.result.as_str())),
            ("sal_support", Value::from(self.sal_support.clone())),
            ("country_focal", Value::from(self.country_focal.clone())),
            ("description", Value::from(self.description.clone())),
        ]
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        let mut row = vec![(
            "department_code",
            Value::from(self.department_code.clone()),
        )];
        row.extend(self.editable_columns());
        row
    }
}

impl DashboardDb {
    pub fn insert_proposal(&self, proposal: &NewProposal) -> Result<i64, DbError> {
        store::insert(self.conn_ref(), Table::Proposals, &proposal.to_row())
    }

    pub fn update_proposal(&self, id: i64, proposal: &NewProposal) -> Result<usize, DbError> {
        store::update(
            self.conn_ref(),
            Table::Proposals,
            &proposal.editable_columns(),
            &[Filter::id(id)],
        )
    }

    pub fn delete_proposal(&self, id: i64) -> Result<usize, DbError> {
        store::delete(self.conn_ref(), Table::Proposals, &[Filter::id(id)])
    }

    /// One department's pipeline, newest entries first.
    pub fn list_proposals(&self, department_code: &str) -> Result<Vec<DbProposal>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT id, department_code, type, country_name, donor, date_submission,
                    result, sal_support, country_focal, description
             FROM proposals
             WHERE department_code = ?1
             ORDER BY id DESC",
        )?;
        let rows = stmt.query_map(params![department_code], map_proposal)?;

        let mut proposals = Vec::new();
        for row in rows {
            proposals.push(row?);
        }
        Ok(proposals)
    }

    /// Distinct submission years present in one department's pipeline.
    pub fn proposal_years(&self, department_code: &str) -> Result<Vec<i32>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT DISTINCT CAST(strftime('%Y', date_submission) AS INTEGER) AS year
             FROM proposals
             WHERE department_code = ?1
             ORDER BY year",
        )?;
        let rows = stmt.query_map(params![department_code], |row| row.get(0))?;

        let mut years = Vec::new();
        for row in rows {
            years.push(row?);
        }
        Ok(years)
    }

    /// Distinct countries with submissions in one department and year.
    pub fn proposal_countries(
        &self,
        department_code: &str,
        year: i32,
    ) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT DISTINCT country_name
             FROM proposals
             WHERE department_code = ?1
               AND CAST(strftime('%Y', date_submission) AS INTEGER) = ?2
             ORDER BY country_name",
        )?;
        let rows = stmt.query_map(params![department_code, year], |row| row.get(0))?;

        let mut countries = Vec::new();
        for row in rows {
            countries.push(row?);
        }
        Ok(countries)
    }
}

fn map_proposal(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbProposal> {
    let result: String = row.get(6)?;
    Ok(DbProposal {
        id: row.get(0)?,
        department_code: row.get(1)?,
        kind: row.get(2)?,
        country_name: row.get(3)?,
        donor: row.get(4)?,
        date_submission: row.get(5)?,
        result: ProposalResult::from_db(&result),
        sal_support: row.get(7)?,
        country_focal: row.get(8)?,
        description: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    pub(crate) fn proposal(dept: &str, country: &str, submitted: NaiveDate) -> NewProposal {
        NewProposal {
            department_code: dept.to_string(),
            kind: "proposal".to_string(),
            country_name: country.to_string(),
            donor: Some("GCF".to_string()),
            date_submission: submitted,
            result: ProposalResult::Pending,
            sal_support: Some("JD".to_string()),
            country_focal: Some("A. Mwangi".to_string()),
            description: None,
        }
    }

    #[test]
    fn test_insert_and_read_back_tri_state() {
        let db = DashboardDb::open_in_memory();
        let mut won = proposal("FIN", "Kenya", date(2025, 3, 1));
        won.result = ProposalResult::Win;
        db.insert_proposal(&won).expect("insert");
        db.insert_proposal(&proposal("FIN", "Uganda", date(2025, 4, 1)))
            .expect("insert");

        let listed = db.list_proposals("FIN").expect("list");
        assert_eq!(listed.len(), 2);
        // Newest first.
        assert_eq!(listed[0].result, ProposalResult::Pending);
        assert_eq!(listed[1].result, ProposalResult::Win);
    }

    #[test]
    fn test_update_result() {
        let db = DashboardDb::open_in_memory();
        let id = db
            .insert_proposal(&proposal("FIN", "Kenya", date(2025, 3, 1)))
            .expect("insert");

        let mut edited = proposal("FIN", "Kenya", date(2025, 3, 1));
        edited.result = ProposalResult::Lost;
        db.update_proposal(id, &edited).expect("update");

        let listed = db.list_proposals("FIN").expect("list");
        assert_eq!(listed[0].result, ProposalResult::Lost);
    }

    #[test]
    fn test_year_and_country_filters() {
        let db = DashboardDb::open_in_memory();
        db.insert_proposal(&proposal("FIN", "Kenya", date(2024, 10, 1)))
            .expect("insert");
        db.insert_proposal(&proposal("FIN", "Uganda", date(2025, 2, 1)))
            .expect("insert");
        db.insert_proposal(&proposal("FIN", "Kenya", date(2025, 6, 1)))
            .expect("insert");

        assert_eq!(db.proposal_years("FIN").expect("years"), vec![2024, 2025]);
        assert_eq!(
            db.proposal_countries("FIN", 2025).expect("countries"),
            vec!["Kenya".to_string(), "Uganda".to_string()]
        );
    }
}
