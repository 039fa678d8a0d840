// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mapping raw failure text to user-facing categories.
//!
//! Ordered substring rules over the lowercased text; the first rule with a
//! matching needle wins. The raw text always travels with the verdict.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    MissingCredentials,
    ClusterNotFound,
    InvalidRegion,
    NotAuthenticated,
    ServerUnreachable,
    UnsupportedAuthMethod,
    CommandTimeout,
    ToolNotInstalled,
    ResourceTypeNotFound,
    ResourceNotFoundInNamespace,
    CloudError,
    Generic,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::MissingCredentials => "missing-credentials",
            ErrorCategory::ClusterNotFound => "cluster-not-found",
            ErrorCategory::InvalidRegion => "invalid-region",
            ErrorCategory::NotAuthenticated => "not-authenticated",
            ErrorCategory::ServerUnreachable => "server-unreachable",
            ErrorCategory::UnsupportedAuthMethod => "unsupported-auth-method",
            ErrorCategory::CommandTimeout => "command-timeout",
            ErrorCategory::ToolNotInstalled => "tool-not-installed",
            ErrorCategory::ResourceTypeNotFound => "resource-type-not-found",
            ErrorCategory::ResourceNotFoundInNamespace => "resource-not-found-in-namespace",
            ErrorCategory::CloudError => "cloud-error",
            ErrorCategory::Generic => "generic",
        }
    }

    /// Fixed human-readable message for the category
    pub fn template(self) -> &'static str {
        match self {
            ErrorCategory::MissingCredentials => {
                "Cloud credentials are missing. Provide an access key pair or paste an export block."
            }
            ErrorCategory::ClusterNotFound => {
                "Cluster not found. Check the cluster name and that it exists in the selected region."
            }
            ErrorCategory::InvalidRegion => {
                "The region is invalid or unreachable. Check the region code (e.g. us-east-1)."
            }
            ErrorCategory::NotAuthenticated => {
                "Authentication failed. The credentials are invalid, expired, or lack access to this cluster."
            }
            ErrorCategory::ServerUnreachable => {
                "Unable to reach the cluster API server. Check network access and the endpoint."
            }
            ErrorCategory::UnsupportedAuthMethod => {
                "The cluster authentication method is not supported by the installed CLI. Upgrade the cloud and cluster CLIs."
            }
            ErrorCategory::CommandTimeout => {
                "The command timed out before completing."
            }
            ErrorCategory::ToolNotInstalled => {
                "A required command-line tool is not installed on the gateway host."
            }
            ErrorCategory::ResourceTypeNotFound => {
                "The cluster does not know this resource type. Check the spelling of the kind."
            }
            ErrorCategory::ResourceNotFoundInNamespace => {
                "The resource was not found. Check its name and the namespace."
            }
            ErrorCategory::CloudError => "The cloud provider returned an error.",
            ErrorCategory::Generic => "The command failed.",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered rules: first match wins. Needles are lowercase.
const RULES: &[(ErrorCategory, &[&str])] = &[
    (
        ErrorCategory::MissingCredentials,
        &[
            "unable to locate credentials",
            "missing credentials",
            "no credentials",
            "nocredentialproviders",
            "could not load credentials",
        ],
    ),
    (
        ErrorCategory::ClusterNotFound,
        &[
            "resourcenotfoundexception",
            "no cluster found",
            "cluster not found",
        ],
    ),
    (
        ErrorCategory::InvalidRegion,
        &[
            "could not connect to the endpoint url",
            "invalid region",
            "unknown region",
            "not a valid region",
        ],
    ),
    (
        ErrorCategory::NotAuthenticated,
        &[
            "unauthorized",
            "you must be logged in",
            "invalidclienttokenid",
            "unrecognizedclientexception",
            "signaturedoesnotmatch",
            "expiredtoken",
            "security token included in the request is invalid",
            "accessdenied",
            "access denied",
        ],
    ),
    (
        ErrorCategory::ServerUnreachable,
        &[
            "unable to connect to the server",
            "connection refused",
            "no such host",
            "i/o timeout",
            "network is unreachable",
            "no route to host",
        ],
    ),
    (
        ErrorCategory::UnsupportedAuthMethod,
        &[
            "exec plugin",
            "client.authentication.k8s.io",
            "invalid apiversion",
        ],
    ),
    (
        ErrorCategory::CommandTimeout,
        &["timed out", "timeout", "deadline exceeded"],
    ),
    (
        ErrorCategory::ToolNotInstalled,
        &[
            "command not found",
            "executable file not found",
            "not recognized as an internal or external command",
            // dash: `sh: 1: kubectl: not found`
            ": not found",
        ],
    ),
    (
        ErrorCategory::ResourceTypeNotFound,
        &["doesn't have a resource type", "no matches for kind"],
    ),
    (
        ErrorCategory::ResourceNotFoundInNamespace,
        &["(notfound)", "not found in namespace"],
    ),
    (
        ErrorCategory::CloudError,
        &["an error occurred (", "botocore", "clienterror"],
    ),
];

/// Category plus the text it was derived from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub category: ErrorCategory,
    pub message: String,
    pub raw: String,
}

pub fn categorize(raw: &str) -> ErrorCategory {
    let lower = raw.to_lowercase();
    RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
        .map(|(category, _)| *category)
        .unwrap_or(ErrorCategory::Generic)
}

pub fn diagnose(raw: impl Into<String>) -> Diagnosis {
    let raw = raw.into();
    let category = categorize(&raw);
    Diagnosis {
        category,
        message: category.template().to_string(),
        raw,
    }
}

#[cfg(test)]
#[path = "diagnose_tests.rs"]
mod tests;
