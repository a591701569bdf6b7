// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Detection Heuristics Library
 * Converts raw probe output into finding decisions
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

pub mod cors;
pub mod entropy;
pub mod enumeration;
pub mod error_patterns;
pub mod rate_limit;
pub mod reflection;
pub mod timing;
pub mod tokens;
