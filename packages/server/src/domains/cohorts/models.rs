//! Published output of the daily analysis.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::domains::scoring::Category;

/// Reward cohorts for one category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryCohort {
    /// Users who met the category's daily requirement.
    pub qualified: Vec<String>,
    /// Top non-qualified users by historical engagement.
    pub empathy: Vec<String>,
}

/// Cohorts for every category from a single analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyCohorts {
    pub run_date: NaiveDate,
    pub cohorts: BTreeMap<Category, CategoryCohort>,
}

impl DailyCohorts {
    pub fn new(run_date: NaiveDate) -> Self {
        let cohorts = Category::ALL
            .iter()
            .map(|c| (*c, CategoryCohort::default()))
            .collect();
        Self { run_date, cohorts }
    }

    pub fn category(&self, category: Category) -> &CategoryCohort {
        &self.cohorts[&category]
    }

    /// Persist the run, replacing any earlier publication for the same date.
    pub async fn save(&self, pool: &PgPool) -> Result<()> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM reward_cohorts WHERE run_date = $1")
            .bind(self.run_date)
            .execute(&mut *tx)
            .await?;

        for (category, cohort) in &self.cohorts {
            sqlx::query(
                "INSERT INTO reward_cohorts (run_date, category, qualified, empathy) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(self.run_date)
            .bind(category.as_str())
            .bind(&cohort.qualified)
            .bind(&cohort.empathy)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Load the most recently published run, if any.
    pub async fn latest(pool: &PgPool) -> Result<Option<Self>> {
        let rows: Vec<(NaiveDate, String, Vec<String>, Vec<String>)> = sqlx::query_as(
            "SELECT run_date, category, qualified, empathy \
             FROM reward_cohorts \
             WHERE run_date = (SELECT MAX(run_date) FROM reward_cohorts)",
        )
        .fetch_all(pool)
        .await?;

        let Some((run_date, _, _, _)) = rows.first() else {
            return Ok(None);
        };

        let mut result = Self::new(*run_date);
        for (_, category, qualified, empathy) in rows {
            if let Some(category) = Category::parse(&category) {
                result
                    .cohorts
                    .insert(category, CategoryCohort { qualified, empathy });
            }
        }

        Ok(Some(result))
    }
}
