use crate::compile::{compile, CompilationMode};

#[tokio::test]
async fn accepted_c_plus_plus_program_compiles() {
  let source = br#"#include <iostream>
int main() { std::cout << "hello\n"; return 0; }
"#;
  let target = std::env::temp_dir().join("inout-judge-test-compile-ok.out");
  let (output, ok) = compile(source, CompilationMode::Release, target.to_str().unwrap())
    .await
    .unwrap();

  assert!(ok, "compilation failed: {}", String::from_utf8_lossy(&output));
  let _ = std::fs::remove_file(&target);
}

#[tokio::test]
async fn broken_source_fails_and_captures_diagnostics() {
  let source = b"this is not valid c++";
  let target = std::env::temp_dir().join("inout-judge-test-compile-ce.out");
  let (output, ok) = compile(source, CompilationMode::Release, target.to_str().unwrap())
    .await
    .unwrap();

  assert!(!ok);
  assert!(!output.is_empty());
  let _ = std::fs::remove_file(&target);
}

#[test]
fn display_command_mentions_the_mode_specific_flags() {
  let cmd = CompilationMode::AnalyzeClang.display_command();
  assert!(cmd.contains("-fsanitize=address"));
  assert!(cmd.contains("clang++") || cmd.contains(&crate::etc::CONFIG.compilers.clangpp));
}
