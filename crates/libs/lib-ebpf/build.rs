use std::{env, fs, path::PathBuf, process::Command};

type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>;

// Kernel struct bindings are generated from the build host's BTF so that
// `task_struct` offsets match the kernel the probes are compiled for.
fn main() -> Result<()> {
	let out_dir = PathBuf::from(env::var("OUT_DIR")?);
	let aya_tool = which::which("aya-tool").map_err(|e| format!("aya-tool not found in PATH: {e}"))?;

	let output = Command::new(&aya_tool).args(["generate", "task_struct"]).output()?;
	if !output.status.success() {
		return Err(format!("aya-tool failed: {}", String::from_utf8_lossy(&output.stderr)).into());
	}

	fs::write(out_dir.join("vmlinux.rs"), output.stdout)?;

	println!("cargo:rerun-if-changed={}", aya_tool.display());
	println!("cargo:rerun-if-changed=/sys/kernel/btf/vmlinux");
	Ok(())
}
