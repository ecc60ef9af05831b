//! Fluent SELECT statement generation.
//!
//! Provides [`Query`] for building custom SQL text that easily incorporates
//! table and column name constants defined in your schema module. The builder
//! accumulates clause fragments in call order and never validates that a
//! referenced column or table exists — misuse surfaces when the rendered
//! text is executed against the store.
//!
//! # Example
//!
//! ```
//! use sqlite_datakit::Query;
//!
//! let sql = Query::new()
//!     .select(&["people.name", "people.age"])
//!     .from("people")
//!     .where_equal_to_text("people.city", "Oslo")
//!     .order_by("people.name", true)
//!     .sql();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT people.name, people.age FROM people \
//!      WHERE people.city = 'Oslo' ORDER BY people.name ASC"
//! );
//! ```

/// Connector state consulted before each predicate append.
///
/// Predicates outside any OR-group are implicitly AND-conjoined in call
/// order; predicates between [`Query::and_either`] and [`Query::end_or`]
/// are joined only by explicit [`Query::or`] calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WhereState {
    /// No predicate yet; the next one opens the WHERE clause.
    NoClause,
    /// At least one predicate added; the next one is AND-prefixed.
    ClauseOpen,
    /// Inside a parenthesized alternation group; no implicit connector.
    InGroup,
}

/// Builder for SELECT statement text.
///
/// Every mutating method takes the builder by value and returns it, so
/// calls chain fluently. [`sql`](Self::sql) consumes the builder: a
/// statement is rendered exactly once and handed to an executor.
///
/// # Examples
///
/// ```
/// use sqlite_datakit::Query;
///
/// // Predicates inside an OR-group are joined by explicit or() calls;
/// // the whole group is parenthesized and AND-ed to what came before.
/// let sql = Query::new()
///     .select(&["id"])
///     .from("tasks")
///     .where_null("completed_at")
///     .and_either()
///     .where_equal_to("priority", "1")
///     .or()
///     .where_equal_to("priority", "2")
///     .end_or()
///     .sql();
///
/// assert_eq!(
///     sql,
///     "SELECT id FROM tasks WHERE completed_at IS NULL \
///      AND (priority = 1 OR priority = 2) "
/// );
/// ```
#[derive(Debug)]
pub struct Query {
    sql: String,
    select_started: bool,
    where_state: WhereState,
    group_by_started: bool,
    order_by_started: bool,
}

impl Query {
    /// Creates an empty builder, opening the SELECT clause.
    pub fn new() -> Self {
        Self {
            sql: String::from("SELECT "),
            select_started: false,
            where_state: WhereState::NoClause,
            group_by_started: false,
            order_by_started: false,
        }
    }

    /// Adds columns to the selection list, in call order.
    ///
    /// The first selected column follows `SELECT ` directly; every later
    /// one is appended with a separating comma. May be called repeatedly
    /// and mixed with [`count`](Self::count).
    pub fn select(mut self, columns: &[&str]) -> Self {
        for column in columns {
            if self.select_started {
                self.sql.push_str(", ");
            }
            self.sql.push_str(column);
            self.select_started = true;
        }
        self
    }

    /// Marks the selection as de-duplicating, then adds columns as
    /// [`select`](Self::select) does.
    pub fn select_distinct(mut self, columns: &[&str]) -> Self {
        self.sql.push_str(" DISTINCT ");
        self.select(columns)
    }

    /// Adds a `COUNT(*)` pseudo-column under the given alias.
    pub fn count(mut self, alias: &str) -> Self {
        if self.select_started {
            self.sql.push_str(", ");
        }
        self.sql.push_str("COUNT(*) ");
        self.sql.push_str(alias);
        self.select_started = true;
        self
    }

    /// Fixes the primary source table (or subquery text).
    pub fn from(mut self, table: &str) -> Self {
        self.sql.push_str(" FROM ");
        self.sql.push_str(table);
        self
    }

    /// Appends an inner join against a named table. Follow with
    /// [`on`](Self::on) to supply the join condition.
    pub fn inner_join(mut self, table: &str) -> Self {
        self.sql.push_str(" INNER JOIN ");
        self.sql.push_str(table);
        self
    }

    /// Appends an inner join against a nested rendered statement under a
    /// mandatory alias, enabling composable subqueries.
    pub fn inner_join_query(mut self, subquery: Query, alias: &str) -> Self {
        self.sql.push_str(" INNER JOIN (");
        self.sql.push_str(&subquery.sql());
        self.sql.push_str(") ");
        self.sql.push_str(alias);
        self
    }

    /// Appends a left outer join against a named table. Follow with
    /// [`on`](Self::on) to supply the join condition.
    pub fn left_outer_join(mut self, table: &str) -> Self {
        self.sql.push_str(" LEFT OUTER JOIN ");
        self.sql.push_str(table);
        self
    }

    /// Supplies the equality condition for the preceding join.
    pub fn on(mut self, from_column: &str, to_column: &str) -> Self {
        self.sql.push_str(" ON ");
        self.sql.push_str(from_column);
        self.sql.push_str(" = ");
        self.sql.push_str(to_column);
        self
    }

    /// Adds an equality predicate against a raw (unquoted) value.
    pub fn where_equal_to(mut self, column: &str, value: &str) -> Self {
        self.prefix_where_subclause();
        self.sql.push_str(column);
        self.sql.push_str(" = ");
        self.sql.push_str(value);
        self
    }

    /// Adds an equality predicate against a quoted text value.
    pub fn where_equal_to_text(mut self, column: &str, value: &str) -> Self {
        self.prefix_where_subclause();
        self.sql.push_str(column);
        self.sql.push_str(" = '");
        self.sql.push_str(value);
        self.sql.push('\'');
        self
    }

    /// Adds an inequality predicate against a quoted text value.
    pub fn where_not_equal_to_text(mut self, column: &str, value: &str) -> Self {
        self.prefix_where_subclause();
        self.sql.push_str(column);
        self.sql.push_str(" <> '");
        self.sql.push_str(value);
        self.sql.push('\'');
        self
    }

    /// Adds a set-membership predicate. The value list is appended verbatim.
    pub fn where_in(mut self, column: &str, value_list: &str) -> Self {
        self.prefix_where_subclause();
        self.sql.push_str(column);
        self.sql.push_str(" IN (");
        self.sql.push_str(value_list);
        self.sql.push(')');
        self
    }

    /// Adds a set-exclusion predicate. The value list is appended verbatim.
    pub fn where_not_in(mut self, column: &str, value_list: &str) -> Self {
        self.prefix_where_subclause();
        self.sql.push_str(column);
        self.sql.push_str(" NOT IN (");
        self.sql.push_str(value_list);
        self.sql.push(')');
        self
    }

    /// Adds a prefix-match predicate (`LIKE 'prefix%'`).
    pub fn where_starts_with(mut self, column: &str, prefix: &str) -> Self {
        self.prefix_where_subclause();
        self.sql.push_str(column);
        self.sql.push_str(" LIKE '");
        self.sql.push_str(prefix);
        self.sql.push_str("%'");
        self
    }

    /// Adds a null-check predicate.
    pub fn where_null(mut self, column: &str) -> Self {
        self.prefix_where_subclause();
        self.sql.push_str(column);
        self.sql.push_str(" IS NULL");
        self
    }

    /// Opens a parenthesized, AND-prefixed alternation group.
    ///
    /// Predicates added before the matching [`end_or`](Self::end_or) carry
    /// no implicit connector; join them with explicit [`or`](Self::or)
    /// calls.
    pub fn and_either(mut self) -> Self {
        self.where_state = WhereState::InGroup;
        self.sql.push_str(" AND (");
        self
    }

    /// Inserts a literal disjunction between predicates inside an
    /// alternation group.
    pub fn or(mut self) -> Self {
        self.sql.push_str(" OR ");
        self
    }

    /// Closes the alternation group. Predicates added afterwards resume
    /// normal AND-conjunction.
    pub fn end_or(mut self) -> Self {
        self.sql.push_str(") ");
        self.where_state = WhereState::ClauseOpen;
        self
    }

    fn prefix_where_subclause(&mut self) {
        match self.where_state {
            WhereState::InGroup => {}
            WhereState::ClauseOpen => self.sql.push_str(" AND "),
            WhereState::NoClause => {
                self.sql.push_str(" WHERE ");
                self.where_state = WhereState::ClauseOpen;
            }
        }
    }

    /// Adds a grouping column. The first call opens the GROUP BY clause;
    /// later calls append comma-separated columns.
    pub fn group_by(mut self, column: &str) -> Self {
        if self.group_by_started {
            self.sql.push_str(", ");
        } else {
            self.sql.push_str(" GROUP BY ");
            self.group_by_started = true;
        }
        self.sql.push_str(column);
        self
    }

    /// Adds an ordering column, ascending or descending. The first call
    /// opens the ORDER BY clause; later calls append comma-separated.
    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        if self.order_by_started {
            self.sql.push_str(", ");
        } else {
            self.sql.push_str(" ORDER BY ");
            self.order_by_started = true;
        }
        self.sql.push_str(column);
        self.sql.push_str(if ascending { " ASC" } else { " DESC" });
        self
    }

    /// Renders the accumulated statement text verbatim, consuming the
    /// builder. No whitespace normalization is performed.
    pub fn sql(self) -> String {
        self.sql
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}
