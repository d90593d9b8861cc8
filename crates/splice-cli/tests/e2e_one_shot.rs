//! One-shot runs of the `splice` binary.
//!
//! Run with: `cargo test -p splice-cli --test e2e_one_shot`

mod common;

use common::Workspace;
use predicates::prelude::*;
use predicates::str::contains;

const REFERENCE: &str = "//# sourceMappingURL=data:application/json;charset=utf-8;base64,";

mod success {
    use super::*;

    #[test]
    fn append_prints_text_and_reference() {
        let ws = Workspace::new(r#"buffer:append(" world")"#, "hello");

        ws.cmd()
            .assert()
            .success()
            .stdout(predicate::str::starts_with(format!("hello world\n{REFERENCE}")));
    }

    #[test]
    fn remove_everything_keeps_reference() {
        let ws = Workspace::new("buffer:remove(0, #original)", "abc");

        ws.cmd()
            .assert()
            .success()
            .stdout(predicate::str::starts_with(format!("\n{REFERENCE}")));
    }

    #[test]
    fn script_print_goes_to_stderr() {
        let ws = Workspace::new(r#"print("len", #original) buffer:prepend(">")"#, "abc");

        ws.cmd()
            .assert()
            .success()
            .stdout(predicate::str::starts_with(">abc\n"))
            .stderr(contains("print: len\t3"));
    }

    #[test]
    fn output_and_map_files() {
        let ws = Workspace::new(r#"buffer:overwrite(0, 5, "HELLO")"#, "hello world");

        ws.cmd()
            .args(["-o", "out.txt", "--map", "out.map"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());

        let output = ws.read("out.txt");
        assert!(output.starts_with(&format!("HELLO world\n{REFERENCE}")));

        let map = ws.read("out.map");
        assert!(map.contains("\"version\":3"));
        assert!(map.contains("\"file\":\"out.txt\""));
        assert!(map.contains("\"sourcesContent\":[\"hello world\"]"));
    }

    #[test]
    fn source_name_and_no_content_flags() {
        let ws = Workspace::new("", "x");

        ws.cmd()
            .args(["--map", "out.map", "--source-name", "page.txt", "--no-content"])
            .assert()
            .success();

        let map = ws.read("out.map");
        assert!(map.contains("\"sources\":[\"page.txt\"]"));
        assert!(!map.contains("sourcesContent"));
    }

    #[test]
    fn project_config_is_applied() {
        let ws = Workspace::new("", "x");
        std::fs::create_dir_all(ws.join(".splice")).unwrap();
        std::fs::write(
            ws.join(".splice/config.toml"),
            "[sourcemap]\nsource = \"configured.txt\"\n",
        )
        .unwrap();

        ws.cmd().args(["--map", "out.map"]).assert().success();

        assert!(ws.read("out.map").contains("\"configured.txt\""));
    }

    #[test]
    fn env_var_is_applied() {
        let ws = Workspace::new("", "x");

        ws.cmd()
            .env("SPLICE_SOURCE_NAME", "from-env.txt")
            .args(["--map", "out.map"])
            .assert()
            .success();

        assert!(ws.read("out.map").contains("\"from-env.txt\""));
    }

    #[test]
    fn log_file_is_written() {
        let ws = Workspace::new(r#"buffer:append("!")"#, "x");

        ws.cmd()
            .args(["--log-file", "logs", "--log-level", "debug"])
            .assert()
            .success();

        let log = ws.read("logs/splice.log");
        assert!(!log.is_empty());
        assert!(!log.contains('\u{1b}'), "log file must not contain ANSI escapes");
    }
}

mod failure {
    use super::*;

    #[test]
    fn syntax_error_exits_nonzero() {
        let ws = Workspace::new("buffer:append(", "hello");

        ws.cmd()
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::is_empty())
            .stderr(contains("error: compile error: "));
    }

    #[test]
    fn raised_error_message_is_shown() {
        let ws = Workspace::new(r#"error("nope", 0)"#, "hello");

        ws.cmd()
            .assert()
            .failure()
            .stderr(contains("error: runtime error: nope"));
    }

    #[test]
    fn out_of_range_edit_is_reported() {
        let ws = Workspace::new("buffer:remove(0, 99)", "abc");

        ws.cmd()
            .assert()
            .failure()
            .stderr(contains("error: buffer error: "));
    }

    #[test]
    fn failure_leaves_output_file_untouched() {
        let ws = Workspace::new("error('x')", "hello");
        std::fs::write(ws.join("out.txt"), "previous").unwrap();

        ws.cmd().args(["-o", "out.txt"]).assert().failure();

        assert_eq!(ws.read("out.txt"), "previous");
    }

    #[test]
    fn instruction_limit_stops_runaway_script() {
        let ws = Workspace::new("while true do end", "hello");

        ws.cmd()
            .args(["--instruction-limit", "100000"])
            .assert()
            .failure()
            .stderr(contains("instruction limit exceeded"));
    }

    #[test]
    fn timeout_stops_runaway_script() {
        let ws = Workspace::new("while true do end", "hello");

        ws.cmd()
            .args(["--timeout-ms", "200"])
            .assert()
            .failure()
            .stderr(contains("timed out after 200ms"));
    }

    #[test]
    fn timeout_stops_pcall_guarded_loop() {
        let ws = Workspace::new(
            "while true do pcall(function() while true do end end) end",
            "hello",
        );

        ws.cmd()
            .args(["--timeout-ms", "100"])
            .assert()
            .failure()
            .stderr(contains("timed out after 100ms"));
    }

    #[test]
    fn missing_input_file() {
        let ws = Workspace::new("", "x");
        std::fs::remove_file(ws.join("input.txt")).unwrap();

        ws.cmd()
            .assert()
            .failure()
            .stderr(contains("failed to read input.txt"));
    }

    #[test]
    fn bad_env_value_is_a_config_error() {
        let ws = Workspace::new("", "x");

        ws.cmd()
            .env("SPLICE_TIMEOUT_MS", "soon")
            .assert()
            .failure()
            .stderr(contains("Config error"));
    }
}
