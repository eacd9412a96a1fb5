//! Cell renderer evaluation.
//!
//! Renderers are operator-authored Lua function expressions. Each one is
//! called with seven positional arguments:
//!
//! ```lua
//! function(value, row, index, rows, key, name, ctx)
//!     return value and "YES" or "NO"
//! end
//! ```
//!
//! | argument | meaning                                      |
//! |----------|----------------------------------------------|
//! | `value`  | raw cell value (`nil` for SQL NULL)          |
//! | `row`    | the raw record the cell belongs to           |
//! | `index`  | 0-based row index within the result set      |
//! | `rows`   | every raw record of the result set           |
//! | `key`    | column key                                   |
//! | `name`   | column display name                          |
//! | `ctx`    | caller supplied context table                |
//!
//! Expressions run in a sandboxed state: only the `string`, `table`, `math`
//! and `utf8` libraries plus the [`helpers`] `fmt` table are available, and
//! every call runs under an instruction budget and a memory cap.

pub mod helpers;
pub mod mapper;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mlua::{
    DeserializeOptions, Function, HookTriggers, Lua, LuaOptions, LuaSerdeExt, SerializeOptions,
    StdLib, Value as LuaValue, VmState,
};
use serde_json::Value;

use crate::model::Record;

pub use mapper::{CellError, MappedRow, MappedRows, RowMapper, UnresolvedRenderer};

/// Marker written into a cell whose renderer failed.
pub const ERROR_MARKER: &str = "#ERROR";

/// Expression used when a column has no renderer.
pub const IDENTITY_EXPRESSION: &str = "function(value) return value end";

/// Instructions executed between budget checks.
const HOOK_INTERVAL: u32 = 1_000;

/// Globals removed from the sandbox.
const BLOCKED_GLOBALS: &[&str] = &["dofile", "loadfile", "load", "print", "collectgarbage"];

/// Errors raised while compiling or invoking a renderer expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("failed to set up renderer sandbox: {0}")]
    Setup(String),

    #[error("renderer expression does not compile: {0}")]
    Compile(String),

    #[error("renderer expression failed: {0}")]
    Runtime(String),

    #[error("renderer exceeded its limits: {0}")]
    Limit(String),

    #[error("value conversion failed: {0}")]
    Conversion(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Resource limits applied to every renderer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLimits {
    pub instruction_limit: u64,
    pub memory_limit_bytes: usize,
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self {
            instruction_limit: 1_000_000,
            memory_limit_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Arguments of a single renderer call.
#[derive(Debug, Clone, Copy)]
pub struct RenderArgs<'a> {
    pub cell_value: &'a Value,
    pub row_record: &'a Record,
    pub row_index: usize,
    pub all_rows: &'a [Record],
    pub column_key: &'a str,
    pub column_name: &'a str,
    pub context: &'a Record,
}

/// A renderer expression compiled into a callable Lua function.
#[derive(Debug, Clone)]
pub struct CompiledRenderer {
    function: Function,
    identity: bool,
}

/// Lua values shared by every call of one batch.
#[derive(Debug, Clone)]
pub struct BatchScope {
    rows: LuaValue,
    context: LuaValue,
}

/// Sandboxed Lua state that compiles and runs renderer expressions.
pub struct RenderEngine {
    lua: Lua,
    spent: Arc<AtomicU64>,
    limits: RenderLimits,
}

impl RenderEngine {
    /// Create an engine with default limits.
    pub fn new() -> RenderResult<Self> {
        Self::with_limits(RenderLimits::default())
    }

    pub fn with_limits(limits: RenderLimits) -> RenderResult<Self> {
        let setup = |e: mlua::Error| RenderError::Setup(e.to_string());

        let lua = Lua::new_with(
            StdLib::STRING | StdLib::TABLE | StdLib::MATH | StdLib::UTF8,
            LuaOptions::default(),
        )
        .map_err(setup)?;

        let globals = lua.globals();
        for name in BLOCKED_GLOBALS {
            globals.set(*name, LuaValue::Nil).map_err(setup)?;
        }
        helpers::register(&lua).map_err(setup)?;
        lua.set_memory_limit(limits.memory_limit_bytes)
            .map_err(setup)?;

        let spent = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&spent);
        let budget = limits.instruction_limit;
        lua.set_hook(
            HookTriggers::new().every_nth_instruction(HOOK_INTERVAL),
            move |_, _| {
                let used = counter.fetch_add(HOOK_INTERVAL as u64, Ordering::Relaxed)
                    + HOOK_INTERVAL as u64;
                if used > budget {
                    Err(mlua::Error::RuntimeError(
                        "instruction budget exhausted".to_string(),
                    ))
                } else {
                    Ok(VmState::Continue)
                }
            },
        );

        Ok(Self { lua, spent, limits })
    }

    pub fn limits(&self) -> RenderLimits {
        self.limits
    }

    /// Compile and immediately invoke `source` with `args`.
    ///
    /// The expression is compiled on every call; bulk rendering should go
    /// through [`RowMapper`], which compiles each renderer once per batch.
    pub fn evaluate(&self, source: &str, args: &RenderArgs<'_>) -> RenderResult<Value> {
        let renderer = self.compile(source)?;
        let scope = self.scope(args.all_rows, args.context)?;
        let row = self.to_lua(args.row_record)?;
        self.call(
            &renderer,
            &scope,
            &row,
            args.cell_value,
            args.row_index,
            args.column_key,
            args.column_name,
        )
    }

    /// Compile a function expression. Blank source compiles to identity.
    pub fn compile(&self, source: &str) -> RenderResult<CompiledRenderer> {
        let identity = source.trim().is_empty();
        let source = if identity {
            IDENTITY_EXPRESSION
        } else {
            source.trim()
        };
        let chunk = format!("return {}", source);

        self.spent.store(0, Ordering::Relaxed);
        let value = self
            .lua
            .load(chunk.as_str())
            .set_name("=renderer")
            .eval::<LuaValue>()
            .map_err(|e| self.classify(e, RenderError::Compile))?;

        match value {
            LuaValue::Function(function) => Ok(CompiledRenderer { function, identity }),
            other => Err(RenderError::Compile(format!(
                "expression evaluates to a {} instead of a function",
                other.type_name()
            ))),
        }
    }

    /// Convert the batch-wide arguments once.
    pub fn scope(&self, all_rows: &[Record], context: &Record) -> RenderResult<BatchScope> {
        Ok(BatchScope {
            rows: self.to_lua(&all_rows)?,
            context: self.to_lua(context)?,
        })
    }

    /// Convert one raw record.
    pub fn row(&self, record: &Record) -> RenderResult<LuaValue> {
        self.to_lua(record)
    }

    /// Invoke a compiled renderer for one cell.
    #[allow(clippy::too_many_arguments)]
    pub fn call(
        &self,
        renderer: &CompiledRenderer,
        scope: &BatchScope,
        row: &LuaValue,
        cell_value: &Value,
        row_index: usize,
        column_key: &str,
        column_name: &str,
    ) -> RenderResult<Value> {
        if renderer.identity {
            return Ok(cell_value.clone());
        }
        let cell = self.cell_to_lua(cell_value)?;

        self.spent.store(0, Ordering::Relaxed);
        let result = renderer
            .function
            .call::<LuaValue>((
                cell,
                row.clone(),
                row_index as i64,
                scope.rows.clone(),
                column_key,
                column_name,
                scope.context.clone(),
            ))
            .map_err(|e| self.classify(e, RenderError::Runtime))?;

        self.lua
            .from_value_with(
                result,
                DeserializeOptions::new()
                    .deny_unsupported_types(false)
                    .deny_recursive_tables(false),
            )
            .map_err(|e| RenderError::Conversion(e.to_string()))
    }

    /// A top-level NULL arrives as `nil`; nested nulls become `null` so arrays
    /// keep their length and objects keep their keys.
    fn cell_to_lua(&self, value: &Value) -> RenderResult<LuaValue> {
        if value.is_null() {
            return Ok(LuaValue::Nil);
        }
        self.lua
            .to_value(value)
            .map_err(|e| RenderError::Conversion(e.to_string()))
    }

    fn to_lua<T: serde::Serialize + ?Sized>(&self, value: &T) -> RenderResult<LuaValue> {
        self.lua
            .to_value_with(
                value,
                SerializeOptions::new()
                    .serialize_none_to_null(false)
                    .serialize_unit_to_null(false),
            )
            .map_err(|e| RenderError::Conversion(e.to_string()))
    }

    fn classify(&self, err: mlua::Error, otherwise: fn(String) -> RenderError) -> RenderError {
        if self.spent.load(Ordering::Relaxed) > self.limits.instruction_limit {
            return RenderError::Limit("instruction budget exhausted".to_string());
        }
        match err {
            mlua::Error::MemoryError(msg) => RenderError::Limit(msg),
            other => otherwise(other.to_string()),
        }
    }
}
