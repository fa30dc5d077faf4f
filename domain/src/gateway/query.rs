//! Row-level query description, shared by every gateway implementation.

use std::fmt;

/// A single column predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, String),
    Neq(String, String),
    Gte(String, String),
    In(String, Vec<String>),
}

impl Filter {
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Filter::Eq(column.to_string(), value.to_string())
    }

    pub fn neq(column: &str, value: impl ToString) -> Self {
        Filter::Neq(column.to_string(), value.to_string())
    }

    pub fn gte(column: &str, value: impl ToString) -> Self {
        Filter::Gte(column.to_string(), value.to_string())
    }

    pub fn in_list<I, V>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        Filter::In(
            column.to_string(),
            values.into_iter().map(|v| v.to_string()).collect(),
        )
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _)
            | Filter::Neq(c, _)
            | Filter::Gte(c, _)
            | Filter::In(c, _) => c,
        }
    }

    /// PostgREST query parameter, e.g. `("mentor_id", "eq.<uuid>")`
    pub fn to_param(&self) -> (String, String) {
        let value = match self {
            Filter::Eq(_, v) => format!("eq.{}", v),
            Filter::Neq(_, v) => format!("neq.{}", v),
            Filter::Gte(_, v) => format!("gte.{}", v),
            Filter::In(_, values) => {
                let quoted: Vec<String> = values.iter().map(|v| quote_list_value(v)).collect();
                format!("in.({})", quoted.join(","))
            }
        };
        (self.column().to_string(), value)
    }
}

/// Values inside `in.(...)` that contain reserved characters must be double-quoted
fn quote_list_value(value: &str) -> String {
    if value.contains([',', '(', ')', '"', ' ']) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}",
            self.column,
            if self.ascending { "asc" } else { "desc" }
        )
    }
}

/// A select against one table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    /// PostgREST `select` expression, may embed related rows
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
}

impl Query {
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl ToString) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    /// Query-string parameters in PostgREST form (unencoded)
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.columns.clone())];
        params.extend(self.filters.iter().map(Filter::to_param));
        if !self.order.is_empty() {
            let order: Vec<String> = self.order.iter().map(Order::to_string).collect();
            params.push(("order".to_string(), order.join(",")));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params() {
        let query = Query::from("sessions")
            .select("*, mentor:mentor_id(full_name)")
            .eq("status", "upcoming")
            .order("date", true);

        assert_eq!(
            query.to_params(),
            vec![
                ("select".to_string(), "*, mentor:mentor_id(full_name)".to_string()),
                ("status".to_string(), "eq.upcoming".to_string()),
                ("order".to_string(), "date.asc".to_string()),
            ]
        );
    }

    #[test]
    fn test_in_filter_quotes_reserved_values() {
        let filter = Filter::in_list("name", ["plain", "with,comma"]);
        assert_eq!(
            filter.to_param(),
            ("name".to_string(), "in.(plain,\"with,comma\")".to_string())
        );
    }

    #[test]
    fn test_comparison_filters() {
        assert_eq!(
            Filter::gte("date", "2024-03-05").to_param(),
            ("date".to_string(), "gte.2024-03-05".to_string())
        );
        assert_eq!(Filter::neq("id", "x").to_param().1, "neq.x");
    }

    #[test]
    fn test_multiple_orders() {
        let query = Query::from("template_versions")
            .order("version", false)
            .order("created_at", true);
        let params = query.to_params();
        assert_eq!(params.last().unwrap().1, "version.desc,created_at.asc");
    }
}
