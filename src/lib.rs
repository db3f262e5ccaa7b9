/*
 * Responsibility
 * - 認証 (authentication) → 認可 (authorization) ゲートの公開モジュール
 * - binary (main.rs) と tests/ の両方からここを経由して使う
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;
