// File-level rewriting: output naming, missing inputs, partial output

#[cfg(test)]
mod tests {
    use autoacc_rs::config::{load_table_config, ConfigError};
    use autoacc_rs::gcode::RewriteError;
    use autoacc_rs::{AccelerationTable, FileManager};
    use std::fs as stdfs;
    use std::io::Write;
    use tempfile::tempdir;

    const TABLE: &str = "\
#*# <---------------------- SAVE_CONFIG ---------------------->
#*# Factor in %: 100
#*# 500, 1000
#*# 1500, 2000
#*# End of table
";

    fn write_file(path: &std::path::Path, contents: &str) {
        let mut file = stdfs::File::create(path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
    }

    #[test]
    fn test_rewrite_file_to_sibling() {
        let dir = tempdir().unwrap();
        let table_path = dir.path().join("autoacc.cfg");
        let input = dir.path().join("cube.gcode");
        write_file(&table_path, TABLE);
        write_file(&input, "G28\nG1 X1000 F60000\n");

        let table = AccelerationTable::from_config(&load_table_config(&table_path).unwrap()).unwrap();
        let manager = FileManager::default();
        let output = manager.output_path_for(&input);
        assert_eq!(output, dir.path().join("cube_parsed.gcode"));

        let stats = manager.rewrite_file(&input, &output, &table).unwrap();
        assert_eq!(stats.moves, 1);
        assert_eq!(
            stdfs::read_to_string(&output).unwrap(),
            "G28\nG1 X1000 F60000\nSET_VELOCITY_LIMIT ACCEL=1500\n"
        );
        // The input is left alone.
        assert_eq!(stdfs::read_to_string(&input).unwrap(), "G28\nG1 X1000 F60000\n");
    }

    #[test]
    fn test_missing_input_creates_no_output() {
        let dir = tempdir().unwrap();
        let table_path = dir.path().join("autoacc.cfg");
        write_file(&table_path, TABLE);
        let table = AccelerationTable::from_config(&load_table_config(&table_path).unwrap()).unwrap();

        let manager = FileManager::default();
        let input = dir.path().join("missing.gcode");
        let output = manager.output_path_for(&input);
        let err = manager.rewrite_file(&input, &output, &table).unwrap_err();
        assert!(matches!(err, RewriteError::InputNotFound { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_empty_table_is_rejected_before_input() {
        let dir = tempdir().unwrap();
        let table_path = dir.path().join("autoacc.cfg");
        write_file(&table_path, "#*# Factor in %: 100\n");
        let err = AccelerationTable::from_config(&load_table_config(&table_path).unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::Empty));
    }

    #[test]
    fn test_partial_output_kept_on_failure() {
        let dir = tempdir().unwrap();
        let table_path = dir.path().join("autoacc.cfg");
        let input = dir.path().join("broken.gcode");
        write_file(&table_path, TABLE);
        write_file(&input, "G28\nG1 X1000 F60000\nG1 Y0 F6000\nM84\n");
        let table = AccelerationTable::from_config(&load_table_config(&table_path).unwrap()).unwrap();

        let manager = FileManager::default();
        let output = manager.output_path_for(&input);
        let err = manager.rewrite_file(&input, &output, &table).unwrap_err();
        assert!(matches!(err, RewriteError::ArithmeticFault { line: 3, .. }));
        assert_eq!(
            stdfs::read_to_string(&output).unwrap(),
            "G28\nG1 X1000 F60000\nSET_VELOCITY_LIMIT ACCEL=1500\n"
        );
    }

    #[test]
    fn test_output_may_not_overwrite_input() {
        let dir = tempdir().unwrap();
        let table_path = dir.path().join("autoacc.cfg");
        let input = dir.path().join("part.gcode");
        write_file(&table_path, TABLE);
        write_file(&input, "G28\n");
        let table = AccelerationTable::from_config(&load_table_config(&table_path).unwrap()).unwrap();

        let manager = FileManager::new("");
        let output = manager.output_path_for(&input);
        let err = manager.rewrite_file(&input, &output, &table).unwrap_err();
        assert!(matches!(err, RewriteError::OutputIsInput { .. }));
        assert_eq!(stdfs::read_to_string(&input).unwrap(), "G28\n");
    }
}
