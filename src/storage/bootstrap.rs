use crate::models::paper::{CodeType, Question, QuestionPaper};
use chrono::Utc;
use uuid::Uuid;

/// Shared scenario text shown to candidates and fed to the scoring service.
pub const EXAM_CONTEXT: &str = "\
Context: Pathfinder is a production tracking and reporting application used by a publishing services company.
It tracks end-to-end production for books and journals, including:
- Projects / titles (e.g., books, issues)
- Jobs and chapters with planned vs actual dates
- Work allocation to teams (composition, copyediting, XML, design, QA, etc.)
- Status, turnaround time (TAT), and SLA compliance
- Dashboards and reports for project managers, clients, and leadership

The legacy Pathfinder is a server-rendered app (e.g., Java/GlassFish with jQuery-based UI) that is being modernized into a React-based SPA (Single Page Application) talking to APIs/microservices.";

pub const DEFAULT_PAPER_TITLE: &str = "Pathfinder React Developer Assessment";

fn q(id: &str, section: &str, title: &str, text: &str, key: &str, code_type: CodeType) -> Question {
    Question {
        id: id.to_string(),
        section: section.to_string(),
        title: title.to_string(),
        text: text.to_string(),
        ideal_answer_key: key.to_string(),
        code_type,
        marks: None,
    }
}

/// The stock paper seeded on first run so the tool is usable before an
/// administrator has authored anything.
pub fn default_paper() -> QuestionPaper {
    const SECTION_A: &str = "Section A – Core React & JavaScript";
    const SECTION_B: &str = "Section B – Advanced React & State Management";
    const SECTION_C: &str = "Section C – Frontend Architecture";
    const SECTION_D: &str = "Section D – UX, Performance & Testing";

    QuestionPaper {
        id: Uuid::new_v4(),
        title: DEFAULT_PAPER_TITLE.to_string(),
        description: "Timed written assessment for React developer candidates joining the Pathfinder modernization team.".to_string(),
        duration: 60,
        created_at: Utc::now(),
        questions: vec![
            q(
                "q1a",
                SECTION_A,
                "1(a). State, Props, and Context",
                "Explain the difference between state, props, and context in React.",
                "State is internal component data (mutable). Props are arguments passed to components (read-only). Context is for global data sharing to avoid prop drilling.",
                CodeType::Text,
            ),
            q(
                "q1b",
                SECTION_A,
                "1(b). Virtual DOM",
                "What is the virtual DOM, and how does React use it for performance improvement?",
                "Virtual DOM is a lightweight copy of the actual DOM. React uses it to diff changes (Reconciliation) and only update modified elements in the real DOM, reducing expensive reflows.",
                CodeType::Text,
            ),
            q(
                "q2",
                SECTION_A,
                "2. React.js Coding – UserSearch",
                "Write a React functional component called UserSearch which:\n- Fetches user data from https://jsonplaceholder.typicode.com/users\n- Has a search input box\n- Filters and displays users based on name\n- Uses useState and useEffect",
                "Component should have state for users, search term. useEffect to fetch data on mount. Filter logic in render or separate variable. Input with onChange.",
                CodeType::Javascript,
            ),
            q(
                "q4b",
                SECTION_B,
                "4(b). Memoization in Job Board",
                "Pathfinder's \"Job Board\" screen shows hundreds of jobs with filters and inline editing. When would you use useMemo and useCallback on this screen? Give a concrete example.",
                "useMemo: For expensive filtered/sorted lists of jobs. useCallback: For event handlers (e.g., handleStatusChange) passed to list items to prevent unnecessary child re-renders.",
                CodeType::Text,
            ),
            q(
                "q5",
                SECTION_B,
                "5. Production Tracking State Design",
                "Pathfinder tracks: Projects, Jobs, Status/Dates, and Summary Metrics. Design a React state structure to store this. Explain how you would update state when: A single job's status is changed; The summary metrics need to be recalculated.",
                "Normalized State: { projects: { byId: {} }, jobs: { byId: {} } }. Updates: Immutable update of specific job. Metrics: Derived state (calculated on the fly) or selector-based.",
                CodeType::Javascript,
            ),
            q(
                "q6",
                SECTION_C,
                "6. Modernizing Legacy App",
                "The existing Pathfinder application is a legacy server-rendered app. Describe how you would gradually modernize it into a React SPA using an incremental/\"strangler\" pattern. Cover: Embedding React, Sharing Auth, Migrating one screen at a time, Minimizing downtime.",
                "Strangler Fig Pattern. Serve React on specific routes (e.g. /new/dashboard). Share cookies for auth. Load balancer routes traffic. Migrate high-value screens first.",
                CodeType::Text,
            ),
            q(
                "q8",
                SECTION_C,
                "8. Microservices Integration",
                "Pathfinder is moving to microservices. Explain how your React app will: Handle auth/tokens securely (HttpOnly cookies), Centralise API calls (Axios/Interceptors), Deal with errors, and Handle expired sessions.",
                "HttpOnly Cookies for security (vs LocalStorage). Centralized Axios instance with Response Interceptor for 401 handling (refresh token or redirect). Global Error Boundary.",
                CodeType::Text,
            ),
            q(
                "q10",
                SECTION_D,
                "10. Performance Optimization",
                "Describe performance techniques for the Production Dashboard and Job Board (hundreds of jobs). Cover: Virtualization, Code-splitting, Memoization.",
                "Virtualization (react-window) for large tables. Code splitting (React.lazy) for route bundles. Memoization (React.memo) for table rows.",
                CodeType::Text,
            ),
        ],
    }
}
