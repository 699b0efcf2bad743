use std::path::Path;
use std::process::Command;

/// Run git against the workspace root, returning trimmed stdout on success
fn git(root: &Path, args: &[&str]) -> Option<String> {
    let out = Command::new("git").arg("-C").arg(root).args(args).output().ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let root = Path::new(&manifest_dir).join("..");

    // `<sha>`, `<sha>-dirty` with uncommitted changes, or `unknown` outside git
    let build = match git(&root, &["rev-parse", "--short", "HEAD"]).filter(|s| !s.is_empty()) {
        Some(sha) => match git(&root, &["status", "--porcelain", "--untracked-files=no"]) {
            Some(status) if !status.is_empty() => format!("{sha}-dirty"),
            _ => sha,
        },
        None => "unknown".to_string(),
    };

    if let Some(head) = git(&root, &["rev-parse", "--git-path", "HEAD"]) {
        println!("cargo:rerun-if-changed={}", root.join(head).display());
    }
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rustc-env=TALLY_BUILD_SHA={build}");
}
