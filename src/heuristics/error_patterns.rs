// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Error Pattern Matching
 * Technology fingerprints from error text leaking in responses
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// SQL error signatures keyed by the database engine they identify.
static SQL_ERROR_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("MySQL", Regex::new(r"(?i)SQL syntax.*?MySQL|You have an error in your SQL syntax|check the manual that corresponds to your (MySQL|MariaDB)").unwrap()),
        ("PostgreSQL", Regex::new(r"(?i)PostgreSQL.*?ERROR|pg_query\(\)|unterminated quoted string|syntax error at or near").unwrap()),
        ("SQLite", Regex::new(r"(?i)SQLite(3::)?(Exception| error)|SQLITE_ERROR|near \x22.*?\x22: syntax error").unwrap()),
        ("Oracle", Regex::new(r"ORA-\d{5}|(?i)Oracle error|quoted string not properly terminated").unwrap()),
        ("SQL Server", Regex::new(r"(?i)Unclosed quotation mark after the character string|Microsoft OLE DB Provider for SQL Server|Incorrect syntax near").unwrap()),
        ("Generic SQL", Regex::new(r"(?i)SQL (syntax|error|statement)|syntax error.*?query|unterminated (string|quote)").unwrap()),
    ]
});

/// Stack-trace shapes keyed by the framework/runtime they identify.
static STACK_TRACE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("Node.js", Regex::new(r"at [\w.<>\[\] ]+ \((?:/[\w.-]+)+:\d+:\d+\)|node_modules[/\\]").unwrap()),
        ("Java", Regex::new(r"(?m)^\s*at [\w.$]+\([\w.]+\.java:\d+\)|java\.lang\.\w+(Exception|Error)").unwrap()),
        ("Python", Regex::new(r#"Traceback \(most recent call last\)|File \x22[^\x22]+\.py\x22, line \d+"#).unwrap()),
        ("PHP", Regex::new(r"(?i)Fatal error:.*? on line \d+|Warning:.*?\.php on line \d+|Stack trace:\s*#0").unwrap()),
        ("Ruby", Regex::new(r"[\w/.-]+\.rb:\d+:in `[^']+'").unwrap()),
        (".NET", Regex::new(r"(?m)at [\w.]+\.[\w]+\([^)]*\) in [A-Za-z]:\\[^:]+:line \d+|System\.\w+Exception").unwrap()),
    ]
});

/// Template-engine error signatures for SSTI probing.
static TEMPLATE_ERROR_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("Jinja2", Regex::new(r"jinja2\.exceptions\.\w+").unwrap()),
        ("Twig", Regex::new(r"(?i)Twig.Error").unwrap()),
        ("Handlebars", Regex::new(r"(?i)Parse error on line \d+.*?Expecting").unwrap()),
        ("EJS", Regex::new(r"(?i)ejs:\d+|SyntaxError.*?compiling ejs").unwrap()),
    ]
});

/// Match a response body against SQL error signatures. Returns the
/// database fingerprint on a hit.
pub fn match_sql_error(body: &str) -> Option<&'static str> {
    SQL_ERROR_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(body))
        .map(|(db, _)| *db)
}

/// Match a response body against stack-trace shapes. Returns the
/// framework fingerprint on a hit.
pub fn match_stack_trace(body: &str) -> Option<&'static str> {
    STACK_TRACE_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(body))
        .map(|(framework, _)| *framework)
}

pub fn match_template_error(body: &str) -> Option<&'static str> {
    TEMPLATE_ERROR_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(body))
        .map(|(engine, _)| *engine)
}

/// Any verbose internal error leaking implementation detail.
pub fn has_verbose_error(body: &str) -> bool {
    match_sql_error(body).is_some()
        || match_stack_trace(body).is_some()
        || match_template_error(body).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_fingerprint() {
        let body = "You have an error in your SQL syntax; check the manual that corresponds to your MySQL server version";
        assert_eq!(match_sql_error(body), Some("MySQL"));
    }

    #[test]
    fn test_generic_sql_syntax_fingerprint() {
        // The exact phrase the reference target leaks.
        assert!(match_sql_error("Database error: SQL syntax near 'OR 1=1'").is_some());
        assert!(match_sql_error("ERROR: unterminated quoted string at or near").is_some());
    }

    #[test]
    fn test_postgres_fingerprint() {
        assert_eq!(
            match_sql_error("PostgreSQL query failed: ERROR: syntax error at or near \"'\""),
            Some("PostgreSQL")
        );
    }

    #[test]
    fn test_clean_body_no_match() {
        let body = r#"{"results": [], "total": 0, "page": 1}"#;
        assert_eq!(match_sql_error(body), None);
        assert_eq!(match_stack_trace(body), None);
        assert!(!has_verbose_error(body));
    }

    #[test]
    fn test_node_stack_trace() {
        let body = "TypeError: Cannot read properties of undefined\n    at Object.handler (/app/src/routes/signalements.js:42:17)";
        assert_eq!(match_stack_trace(body), Some("Node.js"));
    }

    #[test]
    fn test_python_stack_trace() {
        let body = "Traceback (most recent call last):\n  File \"/srv/app/views.py\", line 88, in detail";
        assert_eq!(match_stack_trace(body), Some("Python"));
    }

    #[test]
    fn test_sql_keyword_in_prose_not_flagged() {
        // Marketing copy mentioning SQL must not fingerprint as an error.
        let body = "Our platform uses an SQL database to store citizen reports.";
        assert_eq!(match_sql_error(body), None);
    }
}
