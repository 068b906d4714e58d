//! Document-store tools.
//!
//! One tool per store query, mirroring what the planning and execution
//! agents are prompted to use: module listings, file listings, content
//! lookup, and BM25 search.

use crate::tool::{required_str_arg, Tool, ToolResult};
use async_trait::async_trait;
use mindmap_store::DocumentStore;
use std::sync::Arc;

fn no_params_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}

struct GetAllModules {
    store: DocumentStore,
}

#[async_trait]
impl Tool for GetAllModules {
    fn name(&self) -> &str {
        "get_all_modules"
    }

    fn description(&self) -> &str {
        "List every module name in the document knowledge base."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        no_params_schema()
    }

    async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let modules = self.store.modules().await?;
        Ok(ToolResult::success(serde_json::to_string(&modules)?))
    }
}

struct GetFilesByModule {
    store: DocumentStore,
}

#[async_trait]
impl Tool for GetFilesByModule {
    fn name(&self) -> &str {
        "get_files_by_module"
    }

    fn description(&self) -> &str {
        "List the file names under a module. Returns an empty list for an empty module."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "module": { "type": "string", "description": "Module name, e.g. '1. Inventory'" }
            },
            "required": ["module"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let module = required_str_arg(&args, "module")?;
        let files = self.store.files_by_module(&module).await?;
        Ok(ToolResult::success(serde_json::to_string(&files)?))
    }
}

struct GetContentByFileName {
    store: DocumentStore,
}

#[async_trait]
impl Tool for GetContentByFileName {
    fn name(&self) -> &str {
        "get_content_by_file_name"
    }

    fn description(&self) -> &str {
        "Read the full markdown content of a document by its file name."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_name": { "type": "string", "description": "Document file name without extension" }
            },
            "required": ["file_name"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let file_name = required_str_arg(&args, "file_name")?;
        match self.store.content_by_file_name(&file_name).await? {
            Some(content) => Ok(ToolResult::success(content)),
            None => Ok(ToolResult::failure(format!(
                "No document named '{file_name}'"
            ))),
        }
    }
}

struct GetContentByModule {
    store: DocumentStore,
}

#[async_trait]
impl Tool for GetContentByModule {
    fn name(&self) -> &str {
        "get_content_by_module"
    }

    fn description(&self) -> &str {
        "Read the full content of every document under a module."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "module": { "type": "string", "description": "Module name" }
            },
            "required": ["module"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let module = required_str_arg(&args, "module")?;
        let pairs = self.store.content_by_module(&module).await?;
        let rows: Vec<serde_json::Value> = pairs
            .into_iter()
            .map(|(file_name, content)| {
                serde_json::json!({ "file_name": file_name, "content": content })
            })
            .collect();
        Ok(ToolResult::success(serde_json::to_string(&rows)?))
    }
}

struct GetAllDocuments {
    store: DocumentStore,
}

#[async_trait]
impl Tool for GetAllDocuments {
    fn name(&self) -> &str {
        "get_all_documents"
    }

    fn description(&self) -> &str {
        "List every document's file name and content. Use sparingly; prefer bm25_search."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        no_params_schema()
    }

    async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let documents = self.store.all_documents().await?;
        Ok(ToolResult::success(serde_json::to_string(&documents)?))
    }
}

struct Bm25Search {
    store: DocumentStore,
}

/// Default number of search results.
const DEFAULT_SEARCH_LIMIT: usize = 10;

#[async_trait]
impl Tool for Bm25Search {
    fn name(&self) -> &str {
        "bm25_search"
    }

    fn description(&self) -> &str {
        "Keyword search across all documents. Returns the best-matching file names with scores."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search keywords" },
                "n": { "type": "integer", "description": "Max results (default 10)" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let query = required_str_arg(&args, "query")?;
        let n = args
            .get("n")
            .and_then(serde_json::Value::as_u64)
            .map_or(DEFAULT_SEARCH_LIMIT, |n| n as usize);

        let results = self.store.search(&query, n).await?;
        let rows: Vec<serde_json::Value> = results
            .into_iter()
            .map(|(file_name, score)| serde_json::json!({ "file_name": file_name, "score": score }))
            .collect();
        Ok(ToolResult::success(serde_json::to_string(&rows)?))
    }
}

/// The full set of store tools handed to planning and execution agents.
pub fn store_tools(store: &DocumentStore) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(GetAllModules {
            store: store.clone(),
        }),
        Arc::new(GetFilesByModule {
            store: store.clone(),
        }),
        Arc::new(GetContentByFileName {
            store: store.clone(),
        }),
        Arc::new(GetContentByModule {
            store: store.clone(),
        }),
        Arc::new(GetAllDocuments {
            store: store.clone(),
        }),
        Arc::new(Bm25Search {
            store: store.clone(),
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_store() -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(&dir.path().join("tools.db")).unwrap();
        store
            .insert(
                "3. Receiving",
                Some("3.1 Inbound Orders"),
                Some("Inbound order maintenance and receiving dock flow."),
                None,
            )
            .await
            .unwrap();
        store.insert("4. Shipping", None, None, None).await.unwrap();
        (dir, store)
    }

    fn find<'a>(tools: &'a [Arc<dyn Tool>], name: &str) -> &'a Arc<dyn Tool> {
        tools
            .iter()
            .find(|t| t.name() == name)
            .unwrap_or_else(|| panic!("tool {name} missing"))
    }

    #[tokio::test]
    async fn exposes_all_six_store_tools() {
        let (_dir, store) = seeded_store().await;
        let tools = store_tools(&store);
        let names: Vec<_> = tools.iter().map(|t| t.name().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "get_all_modules",
                "get_files_by_module",
                "get_content_by_file_name",
                "get_content_by_module",
                "get_all_documents",
                "bm25_search",
            ]
        );
    }

    #[tokio::test]
    async fn modules_tool_returns_json_list() {
        let (_dir, store) = seeded_store().await;
        let tools = store_tools(&store);
        let result = find(&tools, "get_all_modules")
            .execute(serde_json::json!({}))
            .await
            .unwrap();
        assert!(result.success);
        let modules: Vec<String> = serde_json::from_str(&result.output).unwrap();
        assert_eq!(modules, vec!["3. Receiving", "4. Shipping"]);
    }

    #[tokio::test]
    async fn files_tool_requires_module_arg() {
        let (_dir, store) = seeded_store().await;
        let tools = store_tools(&store);
        let tool = find(&tools, "get_files_by_module");

        assert!(tool.execute(serde_json::json!({})).await.is_err());

        let result = tool
            .execute(serde_json::json!({"module": "3. Receiving"}))
            .await
            .unwrap();
        let files: Vec<String> = serde_json::from_str(&result.output).unwrap();
        assert_eq!(files, vec!["3.1 Inbound Orders"]);
    }

    #[tokio::test]
    async fn content_tool_reports_unknown_file_as_failure() {
        let (_dir, store) = seeded_store().await;
        let tools = store_tools(&store);
        let tool = find(&tools, "get_content_by_file_name");

        let hit = tool
            .execute(serde_json::json!({"file_name": "3.1 Inbound Orders"}))
            .await
            .unwrap();
        assert!(hit.success);
        assert!(hit.output.contains("receiving dock"));

        let miss = tool
            .execute(serde_json::json!({"file_name": "ghost"}))
            .await
            .unwrap();
        assert!(!miss.success);
    }

    #[tokio::test]
    async fn search_tool_returns_scored_rows() {
        let (_dir, store) = seeded_store().await;
        let tools = store_tools(&store);
        let result = find(&tools, "bm25_search")
            .execute(serde_json::json!({"query": "receiving dock", "n": 3}))
            .await
            .unwrap();
        assert!(result.success);
        let rows: Vec<serde_json::Value> = serde_json::from_str(&result.output).unwrap();
        assert_eq!(rows[0]["file_name"], "3.1 Inbound Orders");
        assert!(rows[0]["score"].as_f64().unwrap() > 0.0);
    }
}
