//! Files written into a fresh project.

/// Message of the single commit a scaffold creates.
pub const INITIAL_COMMIT_MESSAGE: &str = "first commit";

pub const GITIGNORE: &str = "\
# macOS
.DS_Store
.AppleDouble
.LSOverride

# Node.js
node_modules/
npm-debug.log*
yarn-debug.log*
yarn-error.log*

# Python
__pycache__/
*.py[cod]
*.pyo
*.pyd
.Python
env/
venv/
ENV/

# VSCode
.vscode/

# JetBrains IDEs
.idea/
*.iml

# Logs
logs/
*.log

# Environment files
.env
.env.*

# Build output
dist/
build/

# Misc
*.swp
*~
";

pub fn readme(name: &str) -> String {
    format!("# {name}\n")
}
