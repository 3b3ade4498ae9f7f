//! Transform pipeline
//!
//! Each extraction job may declare an ordered list of scripts; every
//! surviving record is passed through each script's `transform` function
//! and replaced by its return value. Scripts run in an embedded engine
//! with no filesystem or network API registered; records cross the
//! boundary as JSON-shaped values and must come back as string-keyed
//! maps. Any script failure aborts the owning job.

use crate::extract::{ExtractError, Record};
use rhai::{Dynamic, Engine, Scope, AST};
use serde_json::Value;

struct CompiledScript {
    name: String,
    ast: AST,
}

/// The ordered transform scripts of one job
pub struct TransformPipeline {
    engine: Engine,
    scripts: Vec<CompiledScript>,
}

impl TransformPipeline {
    /// Reads and compiles every script path, in order
    pub fn load(paths: &[String]) -> Result<Self, ExtractError> {
        let engine = Engine::new();
        let mut scripts = Vec::new();

        for path in paths {
            let failure = |message: String| ExtractError::Transform {
                script: path.clone(),
                message,
            };
            let text = std::fs::read_to_string(path).map_err(|e| failure(e.to_string()))?;
            let ast = engine.compile(&text).map_err(|e| failure(e.to_string()))?;
            scripts.push(CompiledScript {
                name: path.clone(),
                ast,
            });
        }

        Ok(Self { engine, scripts })
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Runs every script over every record, replacing each record with
    /// the script's return value
    pub fn apply_all(&self, records: Vec<Record>) -> Result<Vec<Record>, ExtractError> {
        let mut records = records;
        for script in &self.scripts {
            let mut transformed = Vec::with_capacity(records.len());
            for record in records {
                transformed.push(self.apply_one(script, record)?);
            }
            records = transformed;
        }
        Ok(records)
    }

    fn apply_one(&self, script: &CompiledScript, record: Record) -> Result<Record, ExtractError> {
        let failure = |message: String| ExtractError::Transform {
            script: script.name.clone(),
            message,
        };

        let input = rhai::serde::to_dynamic(Value::Object(record)).map_err(|e| failure(e.to_string()))?;
        let mut scope = Scope::new();
        let output: Dynamic = self
            .engine
            .call_fn(&mut scope, &script.ast, "transform", (input,))
            .map_err(|e| failure(e.to_string()))?;

        let value: Value =
            rhai::serde::from_dynamic(&output).map_err(|e| failure(e.to_string()))?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(failure(
                "script must return a string-keyed map".to_string(),
            )),
        }
    }
}
