// Agent repository behavior: tenant isolation, configured defaults and the
// delete cascade

mod common;

use common::{sample_agent, seed_user, test_pool, test_settings};
use hub_runtime::{AgentOps, AgentUpdate, ChatOps, NewAgent, NewMessage};

#[tokio::test]
async fn create_applies_configured_defaults() {
    let pool = test_pool().await;
    let settings = test_settings();
    let uid = seed_user(&pool, "d@a.com").await;

    let agent_id = AgentOps::create_agent(
        &pool,
        uid,
        &NewAgent {
            max_tokens: None,
            temperature: None,
            ..sample_agent()
        },
        &settings,
    )
    .await
    .unwrap();

    let agent = AgentOps::get_agent(&pool, agent_id, uid).await.unwrap().unwrap();
    assert_eq!(agent.max_tokens, settings.default_agent_max_tokens());
    assert!((agent.temperature - settings.default_temperature).abs() < 1e-9);
    assert_eq!(agent.model, "gpt-4o-mini");
}

#[tokio::test]
async fn create_rejects_out_of_range_numbers() {
    let pool = test_pool().await;
    let settings = test_settings();
    let uid = seed_user(&pool, "v@a.com").await;

    let err = AgentOps::create_agent(
        &pool,
        uid,
        &NewAgent {
            max_tokens: Some(0),
            ..sample_agent()
        },
        &settings,
    )
    .await
    .unwrap_err();
    assert!(err.is_validation());

    let err = AgentOps::create_agent(
        &pool,
        uid,
        &NewAgent {
            temperature: Some(1.5),
            ..sample_agent()
        },
        &settings,
    )
    .await
    .unwrap_err();
    assert!(err.is_validation());

    assert!(AgentOps::list_agents(&pool, uid).await.unwrap().is_empty());
}

#[tokio::test]
async fn other_tenants_see_nothing_and_mutate_nothing() {
    let pool = test_pool().await;
    let settings = test_settings();
    let owner = seed_user(&pool, "owner@a.com").await;
    let stranger = seed_user(&pool, "stranger@a.com").await;

    let agent_id = AgentOps::create_agent(&pool, owner, &sample_agent(), &settings)
        .await
        .unwrap();

    // A non-owner lookup is indistinguishable from a missing agent
    assert!(AgentOps::get_agent(&pool, agent_id, stranger).await.unwrap().is_none());
    assert!(AgentOps::list_agents(&pool, stranger).await.unwrap().is_empty());

    AgentOps::update_agent(
        &pool,
        agent_id,
        stranger,
        &AgentUpdate {
            name: Some("Hijacked".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let agent = AgentOps::get_agent(&pool, agent_id, owner).await.unwrap().unwrap();
    assert_eq!(agent.name, "Agent A");

    AgentOps::delete_agent(&pool, agent_id, stranger).await.unwrap();
    assert!(AgentOps::get_agent(&pool, agent_id, owner).await.unwrap().is_some());
}

#[tokio::test]
async fn partial_update_touches_only_supplied_fields() {
    let pool = test_pool().await;
    let settings = test_settings();
    let uid = seed_user(&pool, "u@a.com").await;
    let agent_id = AgentOps::create_agent(&pool, uid, &sample_agent(), &settings)
        .await
        .unwrap();

    AgentOps::update_agent(
        &pool,
        agent_id,
        uid,
        &AgentUpdate {
            temperature: Some(0.1),
            system_prompt: Some("New prompt".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let agent = AgentOps::get_agent(&pool, agent_id, uid).await.unwrap().unwrap();
    assert!((agent.temperature - 0.1).abs() < 1e-9);
    assert_eq!(agent.system_prompt.as_deref(), Some("New prompt"));
    assert_eq!(agent.name, "Agent A");
    assert_eq!(agent.max_tokens, 256);
}

#[tokio::test]
async fn delete_cascades_chats_and_messages() {
    let pool = test_pool().await;
    let settings = test_settings();
    let uid = seed_user(&pool, "c@a.com").await;
    let agent_id = AgentOps::create_agent(&pool, uid, &sample_agent(), &settings)
        .await
        .unwrap();

    let chat_id = ChatOps::create_chat(&pool, uid, agent_id, None).await.unwrap();
    ChatOps::add_message(&pool, chat_id, "user", "hello", &NewMessage::default())
        .await
        .unwrap();
    ChatOps::add_message(&pool, chat_id, "assistant", "hi", &NewMessage::default())
        .await
        .unwrap();

    AgentOps::delete_agent(&pool, agent_id, uid).await.unwrap();

    assert!(AgentOps::get_agent(&pool, agent_id, uid).await.unwrap().is_none());
    assert!(ChatOps::list_chats(&pool, uid, agent_id).await.unwrap().is_empty());
    assert!(ChatOps::get_messages(&pool, chat_id).await.unwrap().is_empty());
    assert!(ChatOps::get_chat(&pool, chat_id, uid).await.unwrap().is_none());
}
