use std::path::Path;
use std::process::Command;

const SHA_VAR: &str = "FIELDDAY_BUILD_SHA";

/// Version suffix for `fieldday --version`: a preset `FIELDDAY_BUILD_SHA`
/// (packaged builds without a checkout), else `git describe` of the workspace
/// with a `-dirty` marker, else "unknown".
fn main() {
    println!("cargo:rerun-if-env-changed={SHA_VAR}");

    let sha = std::env::var(SHA_VAR)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(git_describe)
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env={SHA_VAR}={sha}");
}

fn git_describe() -> Option<String> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").ok()?;
    let repo_root = Path::new(&manifest_dir).parent()?;

    let head = repo_root.join(".git").join("HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
    }

    let out = Command::new("git")
        .arg("-C")
        .arg(repo_root)
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let described = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!described.is_empty()).then_some(described)
}
