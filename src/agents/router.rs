use crate::{
    agents::{catalog::INTENT_DETECTION, Agent},
    llm::LLMClient,
    memory::EMAIL_STATE_KEY,
    types::{AgentContext, Intent, Result},
};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

/// Reply sent when an employee-specific request arrives without an email.
pub const EMAIL_REQUIRED_MESSAGE: &str = "I can only help with this once I know who you are. \
Please include your employee email address (for example jane.doe@amazincorp.com) in your request.";

/// Reply sent when the request matches no agent.
pub const UNKNOWN_INTENT_MESSAGE: &str = "I can help with your professional development: \
your skills development needs, your training history and remaining training budget, \
the company's professional development policy, finding new training and registering for it, \
and general company information. What would you like to know?";

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").ok());

/// Decides which intent a message expresses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, message: &str, context: &AgentContext) -> Result<Intent>;
}

/// Classifier that asks the LLM for a single intent label.
pub struct LlmIntentClassifier {
    llm: Arc<dyn LLMClient>,
}

impl LlmIntentClassifier {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(&self, message: &str, _context: &AgentContext) -> Result<Intent> {
        let response = self
            .llm
            .generate_with_system(INTENT_DETECTION.instruction, message)
            .await?;

        let intent = parse_intent(&response);
        debug!(raw = %response.trim(), %intent, "Classified request");
        Ok(intent)
    }
}

/// Parse an intent label from LLM output
///
/// This handles various LLM output formats:
/// - Clean output: "FIND_TRAINING"
/// - Different case or separators: "find training"
/// - With extra text: "Intent: FIND_TRAINING."
///
/// Anything unrecognised is [`Intent::Unknown`].
pub fn parse_intent(output: &str) -> Intent {
    let trimmed = output.trim().trim_matches(|c: char| c == '`' || c == '"' || c == '\'');

    if let Some(intent) = Intent::from_label(trimmed) {
        return intent;
    }

    for word in trimmed.split(|c: char| {
        c.is_whitespace() || matches!(c, ':' | ',' | '.' | '"' | '\'' | '`' | '*')
    }) {
        if word.is_empty() {
            continue;
        }
        if let Some(intent) = Intent::from_label(word) {
            return intent;
        }
    }

    let upper = trimmed.to_uppercase().replace(['-', ' '], "_");
    Intent::ALL
        .iter()
        .copied()
        .filter(|intent| *intent != Intent::Unknown)
        .find(|intent| upper.contains(intent.as_str()))
        .unwrap_or(Intent::Unknown)
}

/// First email address mentioned in a message
pub fn extract_email(message: &str) -> Option<String> {
    EMAIL_PATTERN
        .as_ref()
        .and_then(|re| re.find(message))
        .map(|m| m.as_str().to_string())
}

/// Result of routing one request.
#[derive(Debug, Clone)]
pub struct RoutingOutcome {
    pub intent: Intent,
    /// Name of the agent that produced the response
    pub agent: String,
    pub response: String,
}

/// Entry point of the agent graph.
///
/// Classifies each request and delegates it to exactly one agent. Requests
/// about a specific employee are refused until an email is known.
pub struct IntentRouter {
    classifier: Arc<dyn IntentClassifier>,
    routes: HashMap<Intent, Arc<dyn Agent>>,
}

impl IntentRouter {
    pub fn new(classifier: Arc<dyn IntentClassifier>) -> Self {
        Self {
            classifier,
            routes: HashMap::new(),
        }
    }

    pub fn with_route(mut self, intent: Intent, agent: Arc<dyn Agent>) -> Self {
        self.routes.insert(intent, agent);
        self
    }

    pub fn agent_for(&self, intent: Intent) -> Option<&Arc<dyn Agent>> {
        self.routes.get(&intent)
    }

    /// Fill in the context's email from the request, the message or session state.
    fn resolve_email(message: &str, context: &mut AgentContext) {
        let email = context
            .email
            .clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| extract_email(message))
            .or_else(|| {
                context
                    .state
                    .get(EMAIL_STATE_KEY)
                    .and_then(Value::as_str)
                    .map(str::to_string)
            });

        if let Some(email) = email {
            context
                .state
                .insert(EMAIL_STATE_KEY.to_string(), Value::String(email.clone()));
            context.email = Some(email);
        }
    }

    /// Routes a request to the appropriate agent and runs it.
    pub async fn route(&self, message: &str, context: &mut AgentContext) -> Result<RoutingOutcome> {
        Self::resolve_email(message, context);

        let intent = self.classifier.classify(message, context).await?;

        if intent.requires_email() && context.email.is_none() {
            info!(%intent, session = %context.session_id, "Refusing request without employee email");
            return Ok(RoutingOutcome {
                intent,
                agent: INTENT_DETECTION.name.to_string(),
                response: EMAIL_REQUIRED_MESSAGE.to_string(),
            });
        }

        let Some(agent) = self.routes.get(&intent) else {
            debug!(%intent, "No agent handles this intent");
            return Ok(RoutingOutcome {
                intent,
                agent: INTENT_DETECTION.name.to_string(),
                response: UNKNOWN_INTENT_MESSAGE.to_string(),
            });
        };

        info!(%intent, agent = %agent.name(), session = %context.session_id, "Routing request");
        let response = agent.execute(message, context).await?;

        Ok(RoutingOutcome {
            intent,
            agent: agent.name().to_string(),
            response,
        })
    }
}

#[async_trait]
impl Agent for IntentRouter {
    async fn execute(&self, input: &str, context: &mut AgentContext) -> Result<String> {
        self.route(input, context).await.map(|outcome| outcome.response)
    }

    fn name(&self) -> &str {
        INTENT_DETECTION.name
    }

    fn description(&self) -> &str {
        INTENT_DETECTION.description
    }

    fn system_prompt(&self) -> String {
        INTENT_DETECTION.instruction.to_string()
    }

    fn output_key(&self) -> Option<&str> {
        INTENT_DETECTION.output_key
    }

    /// Agents this router can delegate to
    fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .routes
            .values()
            .map(|agent| agent.name().to_string())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::MockLLMClient;
    use crate::types::AppError;
    use parking_lot::Mutex;
    use rstest::rstest;

    /// Agent that records what it was asked and echoes its name.
    struct Recorder {
        name: &'static str,
        seen: Mutex<Vec<(String, Option<String>)>>,
    }

    impl Recorder {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Agent for Recorder {
        async fn execute(&self, input: &str, context: &mut AgentContext) -> Result<String> {
            self.seen
                .lock()
                .push((input.to_string(), context.email.clone()));
            Ok(format!("answer from {}", self.name))
        }
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "records requests"
        }
        fn system_prompt(&self) -> String {
            String::new()
        }
    }

    fn classifier_returning(intent: Intent) -> Arc<dyn IntentClassifier> {
        let mut classifier = MockIntentClassifier::new();
        classifier.expect_classify().returning(move |_, _| Ok(intent));
        Arc::new(classifier)
    }

    #[rstest]
    #[case("FIND_TRAINING", Intent::FindTraining)]
    #[case("  register_training \n", Intent::RegisterTraining)]
    #[case("`PROFESSIONAL_DEVELOPMENT_POLICY`", Intent::ProfessionalDevelopmentPolicy)]
    #[case("Intent: TRAINING_HISTORY_AND_BUDGET.", Intent::TrainingHistoryAndBudget)]
    #[case("The intent is **SKILLS_DEVELOPMENT**", Intent::SkillsDevelopment)]
    #[case("company information", Intent::CompanyInformation)]
    #[case("I am not sure", Intent::Unknown)]
    #[case("", Intent::Unknown)]
    fn test_parse_intent(#[case] output: &str, #[case] expected: Intent) {
        assert_eq!(parse_intent(output), expected);
    }

    #[test]
    fn test_extract_email() {
        assert_eq!(
            extract_email("I'm john.doe@amazincorp.com, what's my budget?"),
            Some("john.doe@amazincorp.com".to_string())
        );
        assert_eq!(extract_email("what's my budget?"), None);
    }

    #[tokio::test]
    async fn test_llm_classifier_parses_label() {
        let mut llm = MockLLMClient::new();
        llm.expect_generate_with_system()
            .withf(|system, _| system.contains("FIND_TRAINING"))
            .returning(|_, _| Ok("FIND_TRAINING".to_string()));

        let classifier = LlmIntentClassifier::new(Arc::new(llm));
        let intent = classifier
            .classify("find me a rust course", &AgentContext::new("s"))
            .await
            .unwrap();
        assert_eq!(intent, Intent::FindTraining);
    }

    #[tokio::test]
    async fn test_employee_request_without_email_is_refused() {
        let skills = Recorder::new("CurrentOrFutureSkillsDevelopmentAgent");
        let router = IntentRouter::new(classifier_returning(Intent::SkillsDevelopment))
            .with_route(Intent::SkillsDevelopment, skills.clone());

        let mut context = AgentContext::new("s1");
        let outcome = router.route("What should I learn next?", &mut context).await.unwrap();

        assert_eq!(outcome.agent, "IntentDetectionAgent");
        assert_eq!(outcome.response, EMAIL_REQUIRED_MESSAGE);
        assert!(skills.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_policy_question_needs_no_email() {
        let policy = Recorder::new("ProfessionalDevelopmentPolicyAgent");
        let router = IntentRouter::new(classifier_returning(Intent::ProfessionalDevelopmentPolicy))
            .with_route(Intent::ProfessionalDevelopmentPolicy, policy.clone());

        let mut context = AgentContext::new("s1");
        let outcome = router
            .route("What is the annual training budget?", &mut context)
            .await
            .unwrap();

        assert_eq!(outcome.agent, "ProfessionalDevelopmentPolicyAgent");
        assert_eq!(outcome.intent, Intent::ProfessionalDevelopmentPolicy);
        assert_eq!(policy.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_email_in_message_is_used_and_stored() {
        let history = Recorder::new("EmployeeTrainingHistoryAndRemainingTrainingBudgetAgent");
        let router = IntentRouter::new(classifier_returning(Intent::TrainingHistoryAndBudget))
            .with_route(Intent::TrainingHistoryAndBudget, history.clone());

        let mut context = AgentContext::new("s1");
        let outcome = router
            .route("My email is jane@amazincorp.com. What's my budget?", &mut context)
            .await
            .unwrap();

        assert_eq!(outcome.response, "answer from EmployeeTrainingHistoryAndRemainingTrainingBudgetAgent");
        assert_eq!(context.email.as_deref(), Some("jane@amazincorp.com"));
        assert_eq!(context.state["email"], "jane@amazincorp.com");
        assert_eq!(
            history.seen.lock()[0].1.as_deref(),
            Some("jane@amazincorp.com")
        );
    }

    #[tokio::test]
    async fn test_email_from_session_state() {
        let registerer = Recorder::new("TrainingRegistererAgent");
        let router = IntentRouter::new(classifier_returning(Intent::RegisterTraining))
            .with_route(Intent::RegisterTraining, registerer.clone());

        let mut context = AgentContext::new("s1");
        context
            .state
            .insert("email".to_string(), Value::String("sam@amazincorp.com".into()));

        let outcome = router.route("Register me for it", &mut context).await.unwrap();
        assert_eq!(outcome.agent, "TrainingRegistererAgent");
        assert_eq!(context.email.as_deref(), Some("sam@amazincorp.com"));
    }

    #[tokio::test]
    async fn test_unknown_intent_gets_help_message() {
        let router = IntentRouter::new(classifier_returning(Intent::Unknown));
        let mut context = AgentContext::new("s1");

        let outcome = router.route("What's the weather?", &mut context).await.unwrap();
        assert_eq!(outcome.intent, Intent::Unknown);
        assert_eq!(outcome.response, UNKNOWN_INTENT_MESSAGE);
    }

    #[tokio::test]
    async fn test_classifier_error_propagates() {
        let mut classifier = MockIntentClassifier::new();
        classifier
            .expect_classify()
            .returning(|_, _| Err(AppError::LLM("unavailable".to_string())));
        let router = IntentRouter::new(Arc::new(classifier));

        let result = router.route("hi", &mut AgentContext::new("s1")).await;
        assert!(matches!(result, Err(AppError::LLM(_))));
    }

    #[test]
    fn test_router_lists_routed_agents() {
        let router = IntentRouter::new(classifier_returning(Intent::Unknown))
            .with_route(Intent::FindTraining, Recorder::new("TrainingFinderAgent"))
            .with_route(Intent::CompanyInformation, Recorder::new("CompanyInformationAgent"));

        assert_eq!(
            router.tool_names(),
            vec!["CompanyInformationAgent", "TrainingFinderAgent"]
        );
        assert_eq!(router.output_key(), Some("email"));
    }
}
