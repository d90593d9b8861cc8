//! Synchronous script evaluation.
//!
//! Every call builds a brand-new Lua VM, compiles the script into a function
//! of exactly two parameters (`buffer`, `original`), runs it against a fresh
//! [`LuaBuffer`](crate::buffer::LuaBuffer), and renders the buffer.
//!
//! # Interruption
//!
//! An instruction-count hook (`Lua::set_hook`) runs every
//! [`HOOK_INTERVAL`] VM instructions and aborts the script when
//!
//! - the cancellation token is cancelled,
//! - the instruction budget is spent, or
//! - the deadline has passed.
//!
//! `coroutine.resume` and `coroutine.wrap` are replaced with versions that
//! carry the hook into the resumed coroutine, so code inside coroutines is
//! metered the same way.
//!
//! Once tripped, the hook fires on every instruction, so a script that
//! catches the error with `pcall` is stopped as soon as `pcall` returns.
//!
//! The checks are coarse: a script may run up to `HOOK_INTERVAL`
//! instructions past any limit. Time spent inside a single C function (a
//! huge `string.rep`, say) is not interrupted.
//!
//! # Output
//!
//! `print` is replaced so output lands in [`Transformed::console`] and the
//! `splice::script` log target instead of stdout.

use crate::buffer::LuaBuffer;
use crate::error::EvalError;
use mlua::{Function, HookTriggers, Lua, MultiValue, Table, Thread, Value, VmState};
use parking_lot::Mutex;
use splice_buffer::{embed_reference, BufferError, MapOptions};
use splice_runtime::config::SpliceConfig;
use splice_runtime::Transformed;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// VM instructions between two watchdog checks.
pub const HOOK_INTERVAL: u32 = 1_000;

/// Maximum captured console bytes per evaluation.
const MAX_CONSOLE_BYTES: usize = 32_768;

/// Binds the two parameters on the script's first line so reported line
/// numbers match the script text.
const PROLOGUE: &str = "local buffer, original = ...; ";

/// Name used in error locations (`script:3: ...`).
const CHUNK_NAME: &str = "=script";

/// Per-evaluation limits and rendering options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalSettings {
    /// Abort after roughly this many VM instructions.
    pub instruction_limit: Option<u64>,
    /// Abort after this much wall-clock time.
    pub timeout: Option<Duration>,
    /// Source map options for rendering.
    pub map: MapOptions,
}

impl EvalSettings {
    /// Settings derived from the executor and sourcemap config sections.
    #[must_use]
    pub fn from_config(config: &SpliceConfig) -> Self {
        Self {
            instruction_limit: config.executor.instruction_limit(),
            timeout: config.executor.timeout(),
            map: config.sourcemap.map_options(),
        }
    }
}

/// Evaluates `script` against a fresh buffer over `original`.
///
/// Blocks the calling thread until the script returns, raises, or is
/// interrupted. Run it on a blocking worker.
///
/// # Errors
///
/// Returns [`EvalError`] for compile errors, runtime errors, rejected
/// buffer operations and interruptions.
///
/// # Example
///
/// ```
/// use splice_lua::{evaluate, EvalSettings};
/// use tokio_util::sync::CancellationToken;
///
/// let out = evaluate(
///     r#"buffer:append(" world")"#,
///     "hello",
///     &EvalSettings::default(),
///     &CancellationToken::new(),
/// )?;
/// assert_eq!(out.text, "hello world");
/// assert!(out.output.starts_with("hello world\n//# sourceMappingURL=data:"));
/// # Ok::<(), splice_lua::EvalError>(())
/// ```
pub fn evaluate(
    script: &str,
    original: &str,
    settings: &EvalSettings,
    cancel: &CancellationToken,
) -> Result<Transformed, EvalError> {
    let watchdog = Arc::new(Watchdog::new(cancel.clone(), settings));
    if let Err(trip) = watchdog.check(0) {
        return Err(trip.into());
    }

    let lua = Lua::new();
    let console = Arc::new(Mutex::new(Console::default()));
    install_print(&lua, Arc::clone(&console)).map_err(EvalError::internal)?;
    install_coroutine_guard(&lua, &watchdog).map_err(EvalError::internal)?;

    let unit = lua
        .load(format!("{PROLOGUE}{script}"))
        .set_name(CHUNK_NAME)
        .into_function()
        .map_err(|e| match e {
            mlua::Error::SyntaxError { message, .. } => EvalError::Compile(message),
            other => EvalError::internal(other),
        })?;

    let buffer = lua
        .create_userdata(LuaBuffer::new(original))
        .map_err(EvalError::internal)?;

    arm(&lua.current_thread(), &watchdog);
    let outcome = unit.call::<()>((buffer.clone(), original));
    lua.remove_hook();

    // a tripped watchdog wins even if the script caught the hook error
    if let Some(trip) = watchdog.tripped() {
        return Err(trip.into());
    }
    outcome.map_err(classify)?;

    let buffer = buffer
        .take::<LuaBuffer>()
        .map_err(|e| EvalError::internal(format!("buffer unavailable after script: {e}")))?;
    let rendered = buffer.into_inner().render(&settings.map);
    let output = embed_reference(&rendered.text, &rendered.map)?;

    let console = std::mem::take(&mut console.lock().lines);

    Ok(Transformed {
        output,
        text: rendered.text,
        map: rendered.map,
        console,
    })
}

/// Installs the watchdog hook on `thread`.
///
/// The VM keeps a single hooked thread, so the hook has to follow the
/// script into every coroutine it resumes and back out again.
fn arm(thread: &Thread, watchdog: &Arc<Watchdog>) {
    if let Some(trip) = watchdog.tripped() {
        thread.set_hook(HookTriggers::new().every_nth_instruction(1), move |_lua, _debug| {
            Err(mlua::Error::RuntimeError(trip.to_string()))
        });
        return;
    }

    let watchdog = Arc::clone(watchdog);
    thread.set_hook(
        HookTriggers::new().every_nth_instruction(HOOK_INTERVAL),
        move |lua, _debug| match watchdog.check(u64::from(HOOK_INTERVAL)) {
            Ok(()) => Ok(VmState::Continue),
            Err(trip) => {
                trip_every_instruction(lua, trip);
                Err(mlua::Error::RuntimeError(trip.to_string()))
            }
        },
    );
}

/// Re-arms the running thread so every further instruction raises `trip`.
///
/// A `pcall` around the interrupted code catches the first error; the next
/// instruction after it returns raises again, one frame further out, until
/// the error leaves the script.
fn trip_every_instruction(lua: &Lua, trip: Trip) {
    lua.set_hook(HookTriggers::new().every_nth_instruction(1), move |_lua, _debug| {
        Err(mlua::Error::RuntimeError(trip.to_string()))
    });
}

/// `coroutine.wrap` rebuilt on top of the guarded `coroutine.resume`.
const COROUTINE_WRAP: &str = r#"
local create, resume, close = coroutine.create, coroutine.resume, coroutine.close
local pack, unpack = table.pack, table.unpack
coroutine.wrap = function(f)
  local co = create(f)
  return function(...)
    local res = pack(resume(co, ...))
    if res[1] then
      return unpack(res, 2, res.n)
    end
    close(co)
    error(res[2], 0)
  end
end
"#;

/// Wraps `coroutine.resume` so the watchdog hook moves onto the resumed
/// coroutine and back onto the caller when it yields or finishes.
fn install_coroutine_guard(lua: &Lua, watchdog: &Arc<Watchdog>) -> mlua::Result<()> {
    let coroutine: Table = lua.globals().get("coroutine")?;
    let resume: Function = coroutine.get("resume")?;
    let watchdog = Arc::clone(watchdog);

    let guarded = lua.create_function(move |lua, (co, mut args): (Value, MultiValue)| {
        let caller = lua.current_thread();
        // re-arming resets the hook's count, so resume itself is a checkpoint
        if let Err(trip) = watchdog.check(0) {
            arm(&caller, &watchdog);
            return Err(mlua::Error::RuntimeError(trip.to_string()));
        }
        if let Value::Thread(thread) = &co {
            arm(thread, &watchdog);
        }
        args.push_front(co);
        let result = resume.call::<MultiValue>(args);
        arm(&caller, &watchdog);
        result
    })?;
    coroutine.set("resume", guarded)?;

    lua.load(COROUTINE_WRAP).set_name("=coroutine").exec()
}

/// Why the watchdog stopped a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trip {
    Cancelled,
    InstructionLimit(u64),
    Timeout(Duration),
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&EvalError::from(*self), f)
    }
}

impl From<Trip> for EvalError {
    fn from(trip: Trip) -> Self {
        match trip {
            Trip::Cancelled => Self::Cancelled,
            Trip::InstructionLimit(limit) => Self::InstructionLimit(limit),
            Trip::Timeout(timeout) => Self::Timeout(timeout),
        }
    }
}

struct Watchdog {
    cancel: CancellationToken,
    limit: Option<u64>,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
    executed: AtomicU64,
    tripped: Mutex<Option<Trip>>,
}

impl Watchdog {
    fn new(cancel: CancellationToken, settings: &EvalSettings) -> Self {
        Self {
            cancel,
            limit: settings.instruction_limit,
            timeout: settings.timeout,
            deadline: settings.timeout.map(|t| Instant::now() + t),
            executed: AtomicU64::new(0),
            tripped: Mutex::new(None),
        }
    }

    /// Accounts for `instructions` more and checks every limit.
    fn check(&self, instructions: u64) -> Result<(), Trip> {
        let executed = self.executed.fetch_add(instructions, Ordering::Relaxed) + instructions;

        let trip = if self.cancel.is_cancelled() {
            Some(Trip::Cancelled)
        } else if let Some(limit) = self.limit.filter(|&limit| executed > limit) {
            Some(Trip::InstructionLimit(limit))
        } else if let (Some(deadline), Some(timeout)) = (self.deadline, self.timeout) {
            (Instant::now() >= deadline).then_some(Trip::Timeout(timeout))
        } else {
            None
        };

        match trip {
            Some(trip) => {
                let mut slot = self.tripped.lock();
                // the first reason sticks
                Err(*slot.get_or_insert(trip))
            }
            None => Ok(()),
        }
    }

    fn tripped(&self) -> Option<Trip> {
        *self.tripped.lock()
    }
}

#[derive(Debug, Default)]
struct Console {
    lines: Vec<String>,
    bytes: usize,
}

/// Replaces the global `print` with one that records into `console`.
///
/// Arguments are formatted with the VM's own `tostring`, so `print(buffer)`
/// prints the buffer's current text.
fn install_print(lua: &Lua, console: Arc<Mutex<Console>>) -> mlua::Result<()> {
    let tostring: mlua::Function = lua.globals().get("tostring")?;
    let print = lua.create_function(move |_, args: MultiValue| {
        let mut parts = Vec::with_capacity(args.len());
        for value in args {
            let s: mlua::String = tostring.call(value)?;
            parts.push(s.to_string_lossy());
        }
        let line = parts.join("\t");
        info!(target: "splice::script", "{line}");

        let mut console = console.lock();
        console.bytes += line.len() + 1;
        if console.bytes <= MAX_CONSOLE_BYTES {
            console.lines.push(line);
        }
        Ok(())
    })?;
    lua.globals().set("print", print)
}

/// Maps a failed call to the error taxonomy.
fn classify(err: mlua::Error) -> EvalError {
    if let Some(buffer_err) = find_buffer_error(&err) {
        return EvalError::from(buffer_err);
    }
    EvalError::Runtime(format_lua_error(&err))
}

fn find_buffer_error(err: &mlua::Error) -> Option<&BufferError> {
    match err {
        mlua::Error::ExternalError(inner) => inner.downcast_ref::<BufferError>(),
        mlua::Error::CallbackError { cause, .. } | mlua::Error::WithContext { cause, .. } => {
            find_buffer_error(cause)
        }
        _ => None,
    }
}

/// Formats an mlua error as one user-facing message without the traceback.
fn format_lua_error(err: &mlua::Error) -> String {
    match err {
        mlua::Error::RuntimeError(msg) => strip_traceback(msg).to_string(),
        mlua::Error::CallbackError { cause, .. } => format_lua_error(cause),
        mlua::Error::WithContext { context, cause } => {
            format!("{context}: {}", format_lua_error(cause))
        }
        other => strip_traceback(&other.to_string()).to_string(),
    }
}

fn strip_traceback(msg: &str) -> &str {
    msg.split("\nstack traceback:").next().unwrap_or(msg).trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(script: &str, original: &str) -> Result<Transformed, EvalError> {
        evaluate(
            script,
            original,
            &EvalSettings::default(),
            &CancellationToken::new(),
        )
    }

    #[test]
    fn both_names_are_bound() {
        let out = eval("buffer:append('|' .. original)", "ab").expect("success");
        assert_eq!(out.text, "ab|ab");
    }

    #[test]
    fn syntax_error_is_compile_error() {
        let err = eval("buffer:append(", "x").unwrap_err();
        match err {
            EvalError::Compile(message) => assert!(message.contains("script:1:"), "{message}"),
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn runtime_error_reports_script_line() {
        let err = eval("local x = 1\nerror('boom')", "x").unwrap_err();
        match err {
            EvalError::Runtime(message) => {
                assert_eq!(message, "script:2: boom");
            }
            other => panic!("expected runtime error, got {other:?}"),
        }
    }

    #[test]
    fn buffer_rejection_is_adapter_error() {
        let err = eval("buffer:overwrite(1, 1, 'x')", "abc").unwrap_err();
        assert!(matches!(
            err,
            EvalError::Adapter {
                code: "BUFFER_ZERO_LENGTH_OVERWRITE",
                ..
            }
        ));
    }

    #[test]
    fn print_is_captured() {
        let out = eval("print('a', 1, true)\nprint(buffer)", "text").expect("success");
        assert_eq!(out.console, vec!["a\t1\ttrue".to_string(), "text".to_string()]);
    }

    #[test]
    fn console_is_capped() {
        let out = eval(
            "for i = 1, 10000 do print(string.rep('x', 99)) end",
            "",
        )
        .expect("success");
        let bytes: usize = out.console.iter().map(|l| l.len() + 1).sum();
        assert!(bytes <= MAX_CONSOLE_BYTES);
        assert!(!out.console.is_empty());
    }

    #[test]
    fn instruction_limit_interrupts_loop() {
        let settings = EvalSettings {
            instruction_limit: Some(50_000),
            ..EvalSettings::default()
        };
        let err = evaluate("while true do end", "", &settings, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, EvalError::InstructionLimit(50_000)));
    }

    #[test]
    fn pcall_cannot_swallow_interrupt() {
        let settings = EvalSettings {
            instruction_limit: Some(10_000),
            ..EvalSettings::default()
        };
        let err = evaluate(
            "for i = 1, 100 do pcall(function() while true do end end) end",
            "",
            &settings,
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::InstructionLimit(_)));
    }

    /// Runs `evaluate` on its own thread, failing the test if it outlives `within`.
    fn eval_bounded(
        script: &'static str,
        settings: EvalSettings,
        cancel: CancellationToken,
        within: Duration,
    ) -> Result<Transformed, EvalError> {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(evaluate(script, "", &settings, &cancel));
        });
        rx.recv_timeout(within)
            .expect("evaluation still running; the interrupt was swallowed")
    }

    const NESTED_PCALL_LOOP: &str = "while true do pcall(function() while true do end end) end";

    #[test]
    fn timeout_escapes_nested_pcall_loop() {
        let settings = EvalSettings {
            timeout: Some(Duration::from_millis(50)),
            ..EvalSettings::default()
        };
        let err = eval_bounded(
            NESTED_PCALL_LOOP,
            settings,
            CancellationToken::new(),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::Timeout(_)), "{err:?}");
    }

    #[test]
    fn instruction_limit_escapes_nested_pcall_loop() {
        let settings = EvalSettings {
            instruction_limit: Some(100_000),
            ..EvalSettings::default()
        };
        let err = eval_bounded(
            NESTED_PCALL_LOOP,
            settings,
            CancellationToken::new(),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::InstructionLimit(100_000)), "{err:?}");
    }

    #[test]
    fn cancel_mid_run_escapes_nested_pcall_loop() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            trigger.cancel();
        });

        let err = eval_bounded(
            NESTED_PCALL_LOOP,
            EvalSettings::default(),
            cancel,
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::Cancelled), "{err:?}");
    }

    #[test]
    fn timeout_reaches_into_coroutines() {
        let settings = EvalSettings {
            timeout: Some(Duration::from_millis(50)),
            ..EvalSettings::default()
        };
        let err = eval_bounded(
            "coroutine.wrap(function() while true do pcall(function() while true do end end) end end)()",
            settings,
            CancellationToken::new(),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::Timeout(_)), "{err:?}");
    }

    #[test]
    fn caller_is_stopped_after_coroutine_trips() {
        let settings = EvalSettings {
            instruction_limit: Some(100_000),
            ..EvalSettings::default()
        };
        let err = eval_bounded(
            "while true do coroutine.resume(coroutine.create(function() while true do end end)) end",
            settings,
            CancellationToken::new(),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::InstructionLimit(100_000)), "{err:?}");
    }

    #[test]
    fn timeout_stops_tight_resume_loop() {
        let settings = EvalSettings {
            timeout: Some(Duration::from_millis(50)),
            ..EvalSettings::default()
        };
        let err = eval_bounded(
            "local f = function() end\nwhile true do pcall(coroutine.resume, coroutine.create(f)) end",
            settings,
            CancellationToken::new(),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::Timeout(_)), "{err:?}");
    }

    #[test]
    fn coroutines_still_yield_and_resume() {
        let out = eval(
            "local gen = coroutine.wrap(function() for i = 1, 3 do coroutine.yield(i) end end)\n\
             local co = coroutine.create(function(a) local b = coroutine.yield(a + 1) return b * 2 end)\n\
             local _, first = coroutine.resume(co, 1)\n\
             local _, second = coroutine.resume(co, 10)\n\
             local ok, dead = coroutine.resume(co)\n\
             buffer:append(gen() .. gen() .. gen() .. ',' .. first .. ',' .. second .. ',' .. tostring(ok))",
            "",
        )
        .expect("success");
        assert_eq!(out.text, "123,2,20,false");
    }

    #[test]
    fn error_handler_cannot_swallow_interrupt() {
        let settings = EvalSettings {
            timeout: Some(Duration::from_millis(50)),
            ..EvalSettings::default()
        };
        let err = eval_bounded(
            "while true do xpcall(function() while true do end end, function(e) return e end) end",
            settings,
            CancellationToken::new(),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::Timeout(_)), "{err:?}");
    }

    #[test]
    fn timeout_interrupts_loop() {
        let settings = EvalSettings {
            timeout: Some(Duration::from_millis(20)),
            ..EvalSettings::default()
        };
        let err = evaluate("while true do end", "", &settings, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, EvalError::Timeout(_)));
    }

    #[test]
    fn cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = evaluate("buffer:append('x')", "", &EvalSettings::default(), &cancel)
            .unwrap_err();
        assert!(matches!(err, EvalError::Cancelled));
    }

    #[test]
    fn strip_traceback_keeps_message() {
        assert_eq!(
            strip_traceback("script:1: boom\nstack traceback:\n\t[C]: in ?"),
            "script:1: boom"
        );
        assert_eq!(strip_traceback("plain"), "plain");
    }
}
