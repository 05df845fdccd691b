use anyhow::{bail, Result};

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Migrate { project: String, dry_run: bool },
    Clean { project: String },
    Help,
}

/// Parse CLI args. Project names may contain spaces, so everything that is
/// not a flag becomes part of the name.
pub fn parse_args(args: &[String]) -> Result<Command> {
    let Some((subcommand, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };

    match subcommand.as_str() {
        "help" | "--help" | "-h" => Ok(Command::Help),
        "migrate" => {
            let (project, dry_run) = parse_project_args(rest, "migrate")?;
            Ok(Command::Migrate { project, dry_run })
        }
        "clean" => {
            let (project, dry_run) = parse_project_args(rest, "clean")?;
            if dry_run {
                bail!("clean does not support --dry-run");
            }
            Ok(Command::Clean { project })
        }
        other => bail!("Unknown command '{other}'. Run `reqtree help` for usage."),
    }
}

fn parse_project_args(args: &[String], subcommand: &str) -> Result<(String, bool)> {
    let mut project_parts: Vec<&str> = Vec::new();
    let mut dry_run = false;

    for arg in args {
        match arg.as_str() {
            "--dry-run" | "-n" => dry_run = true,
            _ => project_parts.push(arg),
        }
    }

    let project = project_parts.join(" ");
    if project.is_empty() {
        bail!("Project name is required. Usage: reqtree {subcommand} <project>");
    }
    Ok((project, dry_run))
}

pub fn print_help() {
    println!("reqtree — migrate a requirements tree from Jira Data Center to Azure DevOps\n");
    println!("USAGE:");
    println!("  reqtree migrate <project> [--dry-run]   Migrate the project's tree");
    println!("  reqtree clean <project>                 Delete the project's tree items");
    println!("  reqtree help                            Show this help");
    println!();
    println!("OPTIONS:");
    println!("  -n, --dry-run   Render the expected tree as an HTML report instead of");
    println!("                  creating the tree structure on the destination");
    println!();
    println!("Credentials and field mappings live in ~/.reqtree/config.toml");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_migrate() {
        let cmd = parse_args(&args(&["migrate", "MyProject"])).unwrap();
        assert_eq!(
            cmd,
            Command::Migrate {
                project: "MyProject".to_string(),
                dry_run: false
            }
        );
    }

    #[test]
    fn parse_migrate_dry_run() {
        let cmd = parse_args(&args(&["migrate", "MyProject", "--dry-run"])).unwrap();
        assert_eq!(
            cmd,
            Command::Migrate {
                project: "MyProject".to_string(),
                dry_run: true
            }
        );
    }

    #[test]
    fn parse_project_name_with_spaces() {
        let cmd = parse_args(&args(&["migrate", "My", "Project", "-n"])).unwrap();
        assert_eq!(
            cmd,
            Command::Migrate {
                project: "My Project".to_string(),
                dry_run: true
            }
        );
    }

    #[test]
    fn parse_clean() {
        let cmd = parse_args(&args(&["clean", "MyProject"])).unwrap();
        assert_eq!(
            cmd,
            Command::Clean {
                project: "MyProject".to_string()
            }
        );
    }

    #[test]
    fn clean_rejects_dry_run() {
        assert!(parse_args(&args(&["clean", "MyProject", "--dry-run"])).is_err());
    }

    #[test]
    fn missing_project_fails() {
        let err = parse_args(&args(&["migrate"])).unwrap_err();
        assert!(err.to_string().contains("Project name is required"));
    }

    #[test]
    fn no_args_shows_help() {
        assert_eq!(parse_args(&[]).unwrap(), Command::Help);
    }

    #[test]
    fn unknown_command_fails() {
        assert!(parse_args(&args(&["frobnicate"])).is_err());
    }
}
