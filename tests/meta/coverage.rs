#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::fs;
    use std::io;
    use std::path::Path;

    /// Relative `.rs` paths and directories under `src` and `tests/unit`
    fn mirrored_trees() -> (HashSet<String>, HashSet<String>) {
        let src_dir = Path::new("src");
        let tests_dir = Path::new("tests/unit");
        let src_paths = relative_paths(src_dir, src_dir)
            .unwrap_or_else(|error| panic!("cannot read src: {error}"));
        let test_paths = relative_paths(tests_dir, tests_dir).unwrap_or_default();
        (src_paths, test_paths)
    }

    fn listing<'a>(
        paths: impl Iterator<Item = &'a String>,
        describe: fn(&str) -> String,
    ) -> String {
        let mut lines: Vec<String> = paths.map(|path| describe(path)).collect();
        lines.sort();
        lines.join("\n")
    }

    // Tests that every source file has a unit test file at the same relative path
    // Verified by deleting a unit test file
    #[test]
    fn test_all_src_files_have_unit_tests() {
        let (src_paths, test_paths) = mirrored_trees();
        let missing = src_paths.iter().filter(|path| {
            !matches!(path.as_str(), "main.rs" | "lib.rs")
                && !path.ends_with("mod.rs")
                && !test_paths.contains(*path)
        });

        let report = listing(missing, |path| format!("  - src/{path} -> tests/unit/{path}"));
        assert!(report.is_empty(), "Source files without unit tests:\n{report}");
    }

    // Tests that no unit test file outlives its source file
    // Verified by renaming a source module
    #[test]
    fn test_all_unit_tests_have_src_counterparts() {
        let (src_paths, test_paths) = mirrored_trees();
        let orphaned = test_paths
            .iter()
            .filter(|path| !path.ends_with("mod.rs") && !src_paths.contains(*path));

        let report = listing(orphaned, |path| format!("  - tests/unit/{path} (no src/{path})"));
        assert!(report.is_empty(), "Unit test files without sources:\n{report}");
    }

    fn relative_paths(dir: &Path, base: &Path) -> io::Result<HashSet<String>> {
        let mut paths = HashSet::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let relative = path
                .strip_prefix(base)
                .map_err(io::Error::other)?
                .to_string_lossy()
                .into_owned();

            if path.is_dir() {
                paths.extend(relative_paths(&path, base)?);
                paths.insert(relative);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                paths.insert(relative);
            }
        }
        Ok(paths)
    }

    // Tests that every unit test file is compiled into the unit harness
    // Verified by deleting a module declaration from a mod.rs
    #[test]
    fn test_all_unit_files_are_declared() {
        let tests_dir = Path::new("tests/unit");
        let harness = fs::read_to_string("tests/unit.rs").unwrap_or_default();
        let mut undeclared = Vec::new();

        let Ok(entries) = fs::read_dir(tests_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            let dir_name = dir
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            if !harness.contains(&format!("mod {dir_name};")) {
                undeclared.push(format!("  - tests/unit/{dir_name} (not in tests/unit.rs)"));
            }

            let module_file = fs::read_to_string(dir.join("mod.rs")).unwrap_or_default();
            for file in fs::read_dir(&dir).into_iter().flatten().flatten() {
                let path = file.path();
                let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                    continue;
                };
                if stem == "mod" || path.extension().and_then(|ext| ext.to_str()) != Some("rs") {
                    continue;
                }
                if !module_file.contains(&format!("pub mod {stem};")) {
                    undeclared.push(format!("  - {}", path.display()));
                }
            }
        }

        assert!(
            undeclared.is_empty(),
            "The following unit test files are never compiled:\n{}",
            undeclared.join("\n")
        );
    }

    // Tests that every test file below the harness roots declares at least one test
    // Verified by emptying a unit test file
    #[test]
    fn test_all_test_files_contain_tests() {
        let tests_dir = Path::new("tests");
        let mut empty = Vec::new();
        collect_files_without_tests(tests_dir, tests_dir, &mut empty)
            .unwrap_or_else(|error| panic!("cannot scan tests: {error}"));

        empty.sort();
        assert!(
            empty.is_empty(),
            "Test files without #[test] functions:\n{}",
            empty.join("\n")
        );
    }

    fn collect_files_without_tests(
        dir: &Path,
        base: &Path,
        empty: &mut Vec<String>,
    ) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                collect_files_without_tests(&path, base, empty)?;
                continue;
            }

            // Harness roots and mod.rs files only declare modules
            let is_declaration = path.parent() == Some(base)
                || path.file_name().is_some_and(|name| name == "mod.rs");
            if is_declaration || path.extension().is_none_or(|ext| ext != "rs") {
                continue;
            }

            if !fs::read_to_string(&path)?.contains("#[test]") {
                empty.push(format!("  - {}", path.display()));
            }
        }
        Ok(())
    }
}
