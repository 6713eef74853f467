//! The plugin catalog.
//!
//! One static row per supported tool, alphabetical. Adding a tool means
//! adding a row; nothing registers at runtime.

mod resolvers;

use crate::plugin::Plugin;

pub static CATALOG: &[Plugin] = &[
    Plugin {
        name: "ava",
        enablers: &["ava"],
        config_files: &["ava.config.{js,cjs,mjs}"],
        entry_files: &["test.{js,cjs,mjs,ts}", "{src,source}/test.{js,cjs,mjs,ts}", "test{s,}/**/*.{js,cjs,mjs,ts}"],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "babel",
        enablers: &["@babel/core", "@babel/cli", "@babel/preset-env"],
        config_files: &[".babelrc", ".babelrc.json", "babel.config.{js,cjs,mjs,json}"],
        entry_files: &[],
        project_files: &[],
        resolve: Some(resolvers::babel),
    },
    Plugin {
        name: "commitlint",
        enablers: &["@commitlint/cli"],
        config_files: &[".commitlintrc", ".commitlintrc.{json,js,cjs}", "commitlint.config.{js,cjs,mjs,ts}"],
        entry_files: &[],
        project_files: &[],
        resolve: Some(resolvers::commitlint),
    },
    Plugin {
        name: "cypress",
        enablers: &["cypress"],
        config_files: &["cypress.config.{js,mjs,cjs,ts}"],
        entry_files: &[
            "cypress/e2e/**/*.cy.{js,jsx,ts,tsx}",
            "cypress/support/e2e.{js,ts}",
            "cypress/support/commands.{js,ts}",
        ],
        project_files: &["cypress/**/*.{js,jsx,ts,tsx}"],
        resolve: None,
    },
    Plugin {
        name: "esbuild",
        enablers: &["esbuild"],
        config_files: &["esbuild.config.{js,cjs,mjs}"],
        entry_files: &[],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "eslint",
        enablers: &["eslint"],
        config_files: &[
            ".eslintrc",
            ".eslintrc.{json,js,cjs}",
            "eslint.config.{js,mjs,cjs,ts}",
        ],
        entry_files: &[],
        project_files: &[],
        resolve: Some(resolvers::eslint),
    },
    Plugin {
        name: "husky",
        enablers: &["husky"],
        config_files: &[".husky/*"],
        entry_files: &[],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "jest",
        enablers: &["jest"],
        config_files: &["jest.config.{js,mjs,cjs,ts,json}"],
        entry_files: &[
            "**/__tests__/**/*.{js,jsx,ts,tsx}",
            "**/*.{test,spec}.{js,jsx,ts,tsx}",
        ],
        project_files: &[],
        resolve: Some(resolvers::jest),
    },
    Plugin {
        name: "lint-staged",
        enablers: &["lint-staged"],
        config_files: &[".lintstagedrc", ".lintstagedrc.{json,js,cjs,mjs}", "lint-staged.config.{js,cjs,mjs}"],
        entry_files: &[],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "mocha",
        enablers: &["mocha"],
        config_files: &[".mocharc.{json,js,cjs,yml}", ".mocharc"],
        entry_files: &["test/**/*.{js,cjs,mjs,ts}"],
        project_files: &[],
        resolve: Some(resolvers::mocha),
    },
    Plugin {
        name: "next",
        enablers: &["next"],
        config_files: &["next.config.{js,mjs,ts}"],
        entry_files: &[
            "pages/**/*.{js,jsx,ts,tsx}",
            "app/**/*.{js,jsx,ts,tsx}",
            "src/pages/**/*.{js,jsx,ts,tsx}",
            "src/app/**/*.{js,jsx,ts,tsx}",
            "middleware.{js,ts}",
        ],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "nx",
        enablers: &["nx", "@nrwl/cli"],
        config_files: &["nx.json", "project.json"],
        entry_files: &[],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "playwright",
        enablers: &["@playwright/test"],
        config_files: &["playwright.config.{js,ts}"],
        entry_files: &[
            "{e2e,tests}/**/*.{test,spec}.{js,ts}",
            "playwright/**/*.{js,ts}",
        ],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "postcss",
        enablers: &["postcss", "postcss-cli"],
        config_files: &["postcss.config.{js,cjs,mjs,json}", ".postcssrc", ".postcssrc.{json,js}"],
        entry_files: &[],
        project_files: &[],
        resolve: Some(resolvers::postcss),
    },
    Plugin {
        name: "prettier",
        enablers: &["prettier"],
        config_files: &[".prettierrc", ".prettierrc.{json,js,cjs,mjs}", "prettier.config.{js,cjs,mjs}"],
        entry_files: &[],
        project_files: &[],
        resolve: Some(resolvers::prettier),
    },
    Plugin {
        name: "release-it",
        enablers: &["release-it"],
        config_files: &[".release-it.json", ".release-it.{js,cjs}"],
        entry_files: &[],
        project_files: &[],
        resolve: Some(resolvers::release_it),
    },
    Plugin {
        name: "remix",
        enablers: &["@remix-run/*"],
        config_files: &["remix.config.{js,mjs}"],
        entry_files: &[
            "app/entry.{client,server}.{js,jsx,ts,tsx}",
            "app/root.{js,jsx,ts,tsx}",
            "app/routes/**/*.{js,jsx,ts,tsx}",
        ],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "rollup",
        enablers: &["rollup"],
        config_files: &["rollup.config.{js,mjs,cjs,ts}"],
        entry_files: &[],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "semantic-release",
        enablers: &["semantic-release"],
        config_files: &[".releaserc", ".releaserc.{json,js,cjs}", "release.config.{js,cjs}"],
        entry_files: &[],
        project_files: &[],
        resolve: Some(resolvers::semantic_release),
    },
    Plugin {
        name: "storybook",
        enablers: &["storybook", "@storybook/*"],
        config_files: &[".storybook/main.{js,mjs,cjs,ts}"],
        entry_files: &[
            ".storybook/**/*.{js,jsx,ts,tsx}",
            "**/*.stories.{js,jsx,ts,tsx,mdx}",
        ],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "stylelint",
        enablers: &["stylelint"],
        config_files: &[".stylelintrc", ".stylelintrc.{json,js,cjs,mjs}", "stylelint.config.{js,cjs,mjs}"],
        entry_files: &[],
        project_files: &[],
        resolve: Some(resolvers::stylelint),
    },
    Plugin {
        name: "svelte",
        enablers: &["svelte"],
        config_files: &["svelte.config.js"],
        entry_files: &[
            "src/routes/**/*.{js,ts,svelte}",
            "src/hooks.{client,server}.{js,ts}",
        ],
        project_files: &["src/**/*.svelte"],
        resolve: None,
    },
    Plugin {
        name: "tailwind",
        enablers: &["tailwindcss"],
        config_files: &["tailwind.config.{js,cjs,mjs,ts}"],
        entry_files: &[],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "tsup",
        enablers: &["tsup"],
        config_files: &["tsup.config.{js,cjs,ts,json}"],
        entry_files: &[],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "turbo",
        enablers: &["turbo"],
        config_files: &["turbo.json"],
        entry_files: &[],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "typedoc",
        enablers: &["typedoc"],
        config_files: &["typedoc.json", "typedoc.{js,cjs}"],
        entry_files: &[],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "typescript",
        enablers: &["typescript"],
        config_files: &["tsconfig.json", "tsconfig.*.json"],
        entry_files: &[],
        project_files: &[],
        resolve: Some(resolvers::typescript),
    },
    Plugin {
        name: "vite",
        enablers: &["vite"],
        config_files: &["vite.config.{js,mjs,cjs,ts}"],
        entry_files: &["index.html"],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "vitest",
        enablers: &["vitest"],
        config_files: &["vitest.config.{js,mjs,cjs,ts}", "vitest.workspace.{js,ts,json}"],
        entry_files: &["**/*.{test,spec}.{js,mjs,cjs,jsx,ts,mts,cts,tsx}"],
        project_files: &[],
        resolve: None,
    },
    Plugin {
        name: "vue",
        enablers: &["vue", "@vue/cli-service"],
        config_files: &["vue.config.{js,cjs,mjs}"],
        entry_files: &[],
        project_files: &["src/**/*.vue"],
        resolve: None,
    },
    Plugin {
        name: "webpack",
        enablers: &["webpack", "webpack-cli"],
        config_files: &["webpack.config.{js,cjs,mjs,ts}", "webpack.{dev,prod}.{js,cjs}"],
        entry_files: &[],
        project_files: &[],
        resolve: None,
    },
];

/// Look a plugin up by its catalog name.
pub fn find_plugin(name: &str) -> Option<&'static Plugin> {
    CATALOG.iter().find(|plugin| plugin.name == name)
}

/// All catalog names, used to validate configuration keys.
pub fn plugin_names() -> Vec<&'static str> {
    CATALOG.iter().map(|plugin| plugin.name).collect()
}
