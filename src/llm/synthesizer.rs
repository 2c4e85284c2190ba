//! Natural-language question to SQLite statement.

use crate::llm::client::{GenerationOptions, LanguageModel};
use crate::llm::extract::ExtractionPolicy;
use crate::query::GeneratedQuery;
use crate::telemetry::llm_span;
use crate::types::{AskError, Result};
use tracing::Instrument;

/// Prompts the model with the schema and the question, then extracts one
/// statement from the reply.
pub struct QuerySynthesizer<'a> {
    model: &'a dyn LanguageModel,
    options: GenerationOptions,
    extraction: ExtractionPolicy,
}

impl<'a> QuerySynthesizer<'a> {
    pub fn new(model: &'a dyn LanguageModel, options: GenerationOptions) -> Self {
        Self {
            model,
            options,
            extraction: ExtractionPolicy::default(),
        }
    }

    pub fn with_extraction(mut self, extraction: ExtractionPolicy) -> Self {
        self.extraction = extraction;
        self
    }

    /// Generate a statement answering `question` against `schema_text`.
    ///
    /// # Arguments
    ///
    /// * `question` - Natural language question, passed through verbatim
    /// * `schema_text` - Rendered schema description
    ///
    /// # Returns
    ///
    /// The extracted statement. Not validated as SQL.
    ///
    /// # Errors
    ///
    /// Returns `AskError::Synthesis` if the model call fails or the reply
    /// holds no statement
    pub async fn synthesize(&self, question: &str, schema_text: &str) -> Result<GeneratedQuery> {
        let prompt = synthesis_prompt(question, schema_text);
        tracing::debug!(prompt_len = prompt.len(), "Synthesis prompt built");

        let span = llm_span(self.model.model_name(), "synthesis");
        let raw = self
            .model
            .complete(&prompt, &self.options)
            .instrument(span)
            .await
            .map_err(|e| AskError::Synthesis(model_failure(e)))?;

        let query = self.extraction.extract(&raw)?;
        tracing::debug!(sql = %query, "SQL extracted");
        Ok(query)
    }
}

fn model_failure(err: AskError) -> String {
    match err {
        AskError::Llm(msg) => msg,
        other => other.to_string(),
    }
}

/// The synthesis prompt. Worked examples are illustrations only.
pub fn synthesis_prompt(question: &str, schema: &str) -> String {
    format!(
        r#"# SQL Query Generator

You are an expert SQL generator that translates natural language queries into valid SQLite SQL queries.

## TASK
Convert the following natural language query into a correct SQLite SQL query using all information from the provided schema.

## IMPORTANT RULES
- Output ONLY the SQL query without any explanation, comments, or additional text
- Use ONLY tables and columns listed in the schema
- Ensure correct SQLite syntax
- Generate complete, executable SQL statements
- Do not wrap the query in code fences or emit incomplete commands

## DATABASE SCHEMA
{schema}

## QUERY TECHNIQUES TO CONSIDER
1. **Basic Queries**
   - Use WHERE clauses for filtering
   - Use LIKE with % for pattern matching

2. **Joins and Relationships**
   - JOIN tables when information spans multiple tables
   - Use appropriate join types (INNER, LEFT, etc.) based on query needs

3. **Aggregation**
   - Use GROUP BY for grouped statistics
   - Apply COUNT(), SUM(), AVG(), MIN(), MAX() as needed
   - Use HAVING for filtering grouped results

4. **Sorting and Limiting**
   - ORDER BY for sorting (ASC/DESC)
   - LIMIT for restricting result size

5. **Date Handling**
   - Use DATE(), STRFTIME() for date manipulation
   - Handle date ranges with comparison operators

6. **Advanced Techniques**
   - Subqueries for complex filtering
   - CASE statements for conditional logic
   - NOT IN / EXISTS for exclusion queries

## EXAMPLE QUERIES AND THEIR SQL EQUIVALENTS

### Basic Queries
1. **Find all customers from New York.**
   SELECT * FROM customers WHERE city = 'New York';

2. **List all orders placed after January 1, 2024.**
   SELECT * FROM orders WHERE order_date > '2024-01-01';

3. **Get all employees who have "Manager" in their job title.**
   SELECT * FROM employees WHERE job_title LIKE '%Manager%';

### Aggregation Queries
1. **Find the total revenue generated from all transactions.**
   SELECT SUM(amount) AS total_revenue FROM transactions;

2. **Count the number of orders placed by each customer.**
   SELECT customer_id, COUNT(*) AS total_orders FROM orders GROUP BY customer_id;

3. **Find the average salary of employees in each department.**
   SELECT department_id, AVG(salary) AS avg_salary FROM employees GROUP BY department_id;

### Sorting and Filtering
1. **List the top 10 highest-paying customers.**
   SELECT customer_id, SUM(amount) AS total_spent FROM transactions GROUP BY customer_id ORDER BY total_spent DESC LIMIT 10;

2. **Find the five most expensive products.**
   SELECT * FROM products ORDER BY price DESC LIMIT 5;

### Complex Queries with JOINs
1. **Get a list of customers who have placed orders along with their total spending.**
   SELECT customers.name, customers.email, SUM(orders.total_price) AS total_spent FROM customers JOIN orders ON customers.id = orders.customer_id GROUP BY customers.id ORDER BY total_spent DESC;

2. **Find all employees and their department names.**
   SELECT employees.name, departments.name AS department_name FROM employees JOIN departments ON employees.department_id = departments.id;

3. **List all orders with product names and quantities.**
   SELECT orders.id AS order_id, products.name AS product_name, order_items.quantity FROM orders JOIN order_items ON orders.id = order_items.order_id JOIN products ON order_items.product_id = products.id;

### Date-Based Queries
1. **Get the total sales revenue for March 2024.**
   SELECT SUM(amount) FROM transactions WHERE strftime('%Y-%m', transaction_date) = '2024-03';

2. **Find employees who were hired in the last 6 months.**
   SELECT * FROM employees WHERE hire_date >= DATE('now', '-6 months');

### Subqueries & Advanced Filtering
1. **Find all customers who have never placed an order.**
   SELECT * FROM customers WHERE id NOT IN (SELECT DISTINCT customer_id FROM orders);

2. **Find the product that has been sold the most.**
   SELECT product_id, COUNT(*) AS sales_count FROM order_items GROUP BY product_id ORDER BY sales_count DESC LIMIT 1;

3. **Get the employees who earn more than the company's average salary.**
   SELECT * FROM employees WHERE salary > (SELECT AVG(salary) FROM employees);

## NATURAL LANGUAGE QUERY
{question}

## SQL QUERY
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::scripted::ScriptedModel;

    const SCHEMA: &str = "Table: customers\nColumns: id (INTEGER) PRIMARY KEY, name (TEXT), city (TEXT)";

    #[test]
    fn test_prompt_embeds_schema_and_question() {
        let prompt = synthesis_prompt("Who lives in Boston?", SCHEMA);
        assert!(prompt.contains("## DATABASE SCHEMA\nTable: customers\n"));
        assert!(prompt.ends_with("## NATURAL LANGUAGE QUERY\nWho lives in Boston?\n\n## SQL QUERY\n"));
    }

    #[tokio::test]
    async fn test_synthesize_takes_first_line() {
        let model = ScriptedModel::new()
            .respond("SELECT name FROM customers WHERE city = 'Boston';\nThis finds Boston customers.");
        let synthesizer = QuerySynthesizer::new(&model, GenerationOptions::default());

        let sql = synthesizer.synthesize("Who lives in Boston?", SCHEMA).await.unwrap();
        assert_eq!(sql.as_str(), "SELECT name FROM customers WHERE city = 'Boston';");
        assert_eq!(model.calls(), 1);
        assert!(model.prompts()[0].contains("Who lives in Boston?"));
    }

    #[tokio::test]
    async fn test_model_failure_is_synthesis_error() {
        let model = ScriptedModel::new().fail("connection refused");
        let synthesizer = QuerySynthesizer::new(&model, GenerationOptions::default());

        let err = synthesizer.synthesize("anything", SCHEMA).await.unwrap_err();
        assert!(matches!(err, AskError::Synthesis(ref m) if m == "connection refused"));
    }

    #[tokio::test]
    async fn test_blank_reply_is_synthesis_error() {
        let model = ScriptedModel::new().respond("   \n  ");
        let synthesizer = QuerySynthesizer::new(&model, GenerationOptions::default());

        let err = synthesizer.synthesize("anything", SCHEMA).await.unwrap_err();
        assert!(matches!(err, AskError::Synthesis(_)));
    }
}
