//! The `buffer` object scripts mutate.
//!
//! Wraps an [`EditBuffer`] as Lua userdata. Mutating methods return the
//! buffer itself so calls chain:
//!
//! ```lua
//! buffer:prepend("/* header */\n"):overwrite(0, 5, "HELLO"):append("\n")
//! ```
//!
//! Indices are 0-based byte offsets into `original`; ranges are half-open.
//! A rejected operation raises a Lua error carrying the [`BufferError`].

use mlua::{AnyUserData, MetaMethod, UserData, UserDataMethods};
use splice_buffer::{BufferError, EditBuffer};

pub(crate) struct LuaBuffer {
    inner: EditBuffer,
}

impl LuaBuffer {
    pub(crate) fn new(original: &str) -> Self {
        Self {
            inner: EditBuffer::new(original),
        }
    }

    pub(crate) fn into_inner(self) -> EditBuffer {
        self.inner
    }
}

/// Applies `op` to the wrapped buffer and hands the userdata back for chaining.
fn mutate(
    ud: AnyUserData,
    op: impl FnOnce(&mut EditBuffer) -> Result<(), BufferError>,
) -> mlua::Result<AnyUserData> {
    {
        let mut this = ud.borrow_mut::<LuaBuffer>()?;
        op(&mut this.inner).map_err(mlua::Error::external)?;
    }
    Ok(ud)
}

impl UserData for LuaBuffer {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_function("append", |_, (ud, content): (AnyUserData, String)| {
            mutate(ud, |b| {
                b.append(&content);
                Ok(())
            })
        });

        methods.add_function("prepend", |_, (ud, content): (AnyUserData, String)| {
            mutate(ud, |b| {
                b.prepend(&content);
                Ok(())
            })
        });

        methods.add_function(
            "append_left",
            |_, (ud, index, content): (AnyUserData, usize, String)| {
                mutate(ud, |b| b.append_left(index, &content).map(drop))
            },
        );

        // insert(i, s) is append_left(i, s)
        methods.add_function(
            "insert",
            |_, (ud, index, content): (AnyUserData, usize, String)| {
                mutate(ud, |b| b.append_left(index, &content).map(drop))
            },
        );

        methods.add_function(
            "prepend_left",
            |_, (ud, index, content): (AnyUserData, usize, String)| {
                mutate(ud, |b| b.prepend_left(index, &content).map(drop))
            },
        );

        methods.add_function(
            "append_right",
            |_, (ud, index, content): (AnyUserData, usize, String)| {
                mutate(ud, |b| b.append_right(index, &content).map(drop))
            },
        );

        methods.add_function(
            "prepend_right",
            |_, (ud, index, content): (AnyUserData, usize, String)| {
                mutate(ud, |b| b.prepend_right(index, &content).map(drop))
            },
        );

        methods.add_function(
            "overwrite",
            |_, (ud, start, end, content): (AnyUserData, usize, usize, String)| {
                mutate(ud, |b| b.overwrite(start, end, &content).map(drop))
            },
        );

        methods.add_function(
            "update",
            |_, (ud, start, end, content): (AnyUserData, usize, usize, String)| {
                mutate(ud, |b| b.update(start, end, &content).map(drop))
            },
        );

        methods.add_function(
            "remove",
            |_, (ud, start, end): (AnyUserData, usize, usize)| {
                mutate(ud, |b| b.remove(start, end).map(drop))
            },
        );

        methods.add_method("to_string", |_, this, ()| Ok(this.inner.to_string()));
        methods.add_method("len", |_, this, ()| Ok(this.inner.len()));
        methods.add_method("has_changed", |_, this, ()| Ok(this.inner.has_changed()));
        methods.add_method("original", |_, this, ()| {
            Ok(this.inner.original().to_string())
        });

        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(this.inner.to_string())
        });
        methods.add_meta_method(MetaMethod::Len, |_, this, ()| Ok(this.inner.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlua::Lua;

    fn run(original: &str, code: &str) -> mlua::Result<EditBuffer> {
        let lua = Lua::new();
        let ud = lua.create_userdata(LuaBuffer::new(original))?;
        lua.globals().set("buffer", ud.clone())?;
        lua.load(code).exec()?;
        Ok(ud.take::<LuaBuffer>()?.into_inner())
    }

    #[test]
    fn methods_chain() {
        let buffer = run(
            "hello world",
            r#"buffer:overwrite(0, 5, "HELLO"):append("!"):prepend("> ")"#,
        )
        .expect("script runs");
        assert_eq!(buffer.to_string(), "> HELLO world!");
    }

    #[test]
    fn inspection_methods() {
        let buffer = run(
            "abc",
            r#"
            assert(buffer:len() == 3)
            assert(#buffer == 3)
            assert(not buffer:has_changed())
            buffer:insert(3, "d")
            assert(tostring(buffer) == "abcd")
            assert(buffer:to_string() == "abcd")
            assert(buffer:has_changed())
            assert(buffer:original() == "abc")
            "#,
        )
        .expect("script runs");
        assert_eq!(buffer.to_string(), "abcd");
    }

    #[test]
    fn rejected_operation_raises_buffer_error() {
        let err = run("abc", "buffer:remove(0, 10)").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("out of bounds"), "got: {message}");
    }

    #[test]
    fn negative_index_is_a_conversion_error() {
        assert!(run("abc", "buffer:remove(-1, 2)").is_err());
    }

    #[test]
    fn pcall_catches_rejection_and_buffer_stays_usable() {
        let buffer = run(
            "abc",
            r#"
            local ok = pcall(function() buffer:overwrite(1, 1, "x") end)
            assert(not ok)
            buffer:append("!")
            "#,
        )
        .expect("script runs");
        assert_eq!(buffer.to_string(), "abc!");
    }
}
