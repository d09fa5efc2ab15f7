mod common;

use common::{CommandOutput, TestContext};

#[test]
#[cfg(feature = "e2e")]
fn e2e_install_and_run_tailwind_help() {
    let ctx = TestContext::new();

    // Example: tailwind-build ensure --tag v4.1.18
    let output: CommandOutput = ctx
        .cmd()
        .env_remove("TAILWIND_API_BASE")
        .args(["ensure", "--tag", "v4.1.18"])
        .output()
        .expect("Failed to run tailwind-build")
        .into();

    output.assert_success();
    let cli = output.stdout.trim().to_string();
    assert!(std::path::Path::new(&cli).exists(), "missing binary at {}", cli);

    let output: CommandOutput = std::process::Command::new(&cli)
        .arg("--help")
        .output()
        .expect("Failed to run tailwindcss")
        .into();

    output.assert_success();
}

#[test]
#[cfg(feature = "e2e")]
fn e2e_build_with_downloaded_cli() {
    let ctx = TestContext::new();
    std::fs::write(ctx.project_file("index.html"), "<div class=\"text-red-500\"></div>").unwrap();

    // Example: tailwind-build build --tag v4.1.18 -o dist/site.css --minify
    let output: CommandOutput = ctx
        .cmd()
        .env_remove("TAILWIND_API_BASE")
        .args(["build", "--tag", "v4.1.18", "-o", "dist/site.css", "--minify"])
        .output()
        .expect("Failed to run tailwind-build")
        .into();

    output.assert_success().assert_stdout_contains("site.css");
    let css = std::fs::read_to_string(ctx.project_file("dist/site.css")).unwrap();
    assert!(css.contains("text-red-500"));
}

#[test]
#[cfg(feature = "e2e")]
fn e2e_unknown_release_fails() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .cmd()
        .env_remove("TAILWIND_API_BASE")
        .args(["ensure", "--tag", "42069"])
        .output()
        .expect("Failed to run tailwind-build")
        .into();

    output
        .assert_failure()
        .assert_stderr_contains("not found");
}
