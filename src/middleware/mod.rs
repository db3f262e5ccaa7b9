/*
 * Responsibility
 * - middleware の公開インターフェース (re-export)
 * - http: transport 層 (request-id / trace / timeout / body limit)
 * - auth: 認証 → 認可ゲート
 */
pub mod auth;
pub mod http;
